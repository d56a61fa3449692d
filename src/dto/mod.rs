mod requests;
mod responses;

pub use requests::{CreatePostRequest, LoginRequest, RegisterRequest};
pub use responses::{PostCreatedResponse, TokenResponse};
