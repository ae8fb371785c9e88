mod author_repository;
mod book_repository;
mod comment_repository;
mod follow_repository;
mod like_repository;
mod notification_repository;
mod post_repository;
mod profile_repository;
mod tag_repository;
mod user_repository;

pub use author_repository::AuthorRepository;
pub use book_repository::{BookFilter, BookRepository};
pub use comment_repository::CommentRepository;
pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use notification_repository::NotificationRepository;
pub use post_repository::{PostFilter, PostRepository};
pub use profile_repository::ProfileRepository;
pub use tag_repository::TagRepository;
pub use user_repository::UserRepository;
