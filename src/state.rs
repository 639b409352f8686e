use crate::{
    config::Config,
    services::{
        database::Database,
        auth::AuthService,
        user::UserService,
        notification::NotificationService,
        follow::FollowService,
        report::ReportService,
        post::PostService,
        comment::CommentService,
        reaction::ReactionService,
        feed::FeedService,
        message::MessageService,
        status::StatusService,
        measurement::MeasurementService,
        vendor::VendorService,
        article::ArticleService,
        order::OrderService,
        payment::PaymentService,
        maintenance::MaintenanceService,
    },
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub notification_service: NotificationService,
    pub follow_service: FollowService,
    pub report_service: ReportService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
    pub feed_service: FeedService,
    pub message_service: MessageService,
    pub status_service: StatusService,
    pub measurement_service: MeasurementService,

    // 商城
    pub vendor_service: VendorService,
    pub article_service: ArticleService,
    pub order_service: OrderService,
    pub payment_service: PaymentService,

    /// 定时维护任务
    pub maintenance_service: MaintenanceService,
}

impl AppState {
    /// 按依赖顺序初始化所有服务
    pub async fn build(config: Config, db: Arc<Database>) -> crate::error::Result<Self> {
        let auth_service = AuthService::new(&config, db.clone()).await?;
        let user_service = UserService::new(db.clone(), auth_service.clone()).await?;
        let notification_service = NotificationService::new(db.clone()).await?;
        let follow_service = FollowService::new(db.clone(), notification_service.clone()).await?;
        let report_service = ReportService::new(db.clone()).await?;
        let post_service =
            PostService::new(db.clone(), &config, notification_service.clone()).await?;
        let comment_service =
            CommentService::new(db.clone(), &config, notification_service.clone()).await?;
        let reaction_service =
            ReactionService::new(db.clone(), notification_service.clone()).await?;
        let feed_service = FeedService::new(
            db.clone(),
            &config,
            follow_service.clone(),
            report_service.clone(),
        )
        .await?;
        let message_service =
            MessageService::new(db.clone(), &config, notification_service.clone()).await?;
        let status_service = StatusService::new(db.clone(), &config, follow_service.clone()).await?;
        let measurement_service = MeasurementService::new(db.clone()).await?;
        let vendor_service = VendorService::new(db.clone()).await?;
        let article_service = ArticleService::new(db.clone(), vendor_service.clone()).await?;
        let order_service = OrderService::new(
            db.clone(),
            vendor_service.clone(),
            notification_service.clone(),
        )
        .await?;
        let payment_service = PaymentService::new(db.clone(), order_service.clone()).await?;
        let maintenance_service = MaintenanceService::new(db.clone()).await?;

        Ok(Self {
            config,
            db,
            auth_service,
            user_service,
            notification_service,
            follow_service,
            report_service,
            post_service,
            comment_service,
            reaction_service,
            feed_service,
            message_service,
            status_service,
            measurement_service,
            vendor_service,
            article_service,
            order_service,
            payment_service,
            maintenance_service,
        })
    }

    /// 获取分页参数
    pub fn page_params(&self, page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
        self.config.page_params(page, limit)
    }
}
