// Handlers 模块 - 转发端点处理器

pub mod token;

pub use token::handle_token_proxy;
