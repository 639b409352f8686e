pub mod database;
pub mod auth;
pub mod user;
pub mod notification;
pub mod follow;
pub mod report;
pub mod post;
pub mod comment;
pub mod reaction;
pub mod feed;
pub mod message;
pub mod status;
pub mod measurement;
pub mod vendor;
pub mod article;
pub mod order;
pub mod payment;
pub mod maintenance;

// 重新导出常用类型
pub use database::{Database, PaginatedResult};
pub use auth::AuthService;
pub use user::UserService;
pub use notification::NotificationService;
pub use follow::FollowService;
pub use report::ReportService;
pub use post::PostService;
pub use comment::CommentService;
pub use reaction::ReactionService;
pub use feed::FeedService;
pub use message::MessageService;
pub use status::StatusService;
pub use measurement::MeasurementService;
pub use vendor::VendorService;
pub use article::ArticleService;
pub use order::OrderService;
pub use payment::PaymentService;
pub use maintenance::MaintenanceService;
