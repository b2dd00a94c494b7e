mod article;
mod resource;

pub use article::Article;
pub use resource::Resource;
