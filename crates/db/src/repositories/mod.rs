pub mod comment_repo;
pub mod user_repo;

pub use comment_repo::CommentRepo;
pub use user_repo::UserRepo;
