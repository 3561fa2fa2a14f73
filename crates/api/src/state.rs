use std::sync::Arc;

use patitas_domain::ports::adoptions::AdoptionRepository;
use patitas_domain::ports::appointments::AppointmentRepository;
use patitas_domain::ports::audit::AuditLogRepository;
use patitas_domain::ports::dogs::DogRepository;
use patitas_domain::ports::favorites::FavoriteRepository;
use patitas_domain::ports::followups::FollowupRepository;
use patitas_domain::ports::messaging::MessageRepository;
use patitas_domain::ports::notifications::NotificationPreferenceRepository;
use patitas_domain::ports::profiles::ProfileRepository;
use patitas_domain::ports::reviews::ReviewRepository;
use patitas_domain::realtime::MessageFeed;
use patitas_domain::session::SessionHub;

use patitas_infra::auth::SurrealAuthService;
use patitas_infra::config::AppConfig;
use patitas_infra::db::{DbConfig, SurrealAdapter};
use patitas_infra::mailer::MailerClient;
use patitas_infra::media::MediaClient;
use patitas_infra::repositories::{
    InMemoryAdoptionRepository, InMemoryAppointmentRepository, InMemoryAuditRepository,
    InMemoryDogRepository, InMemoryFavoriteRepository, InMemoryFollowupRepository,
    InMemoryMessageRepository, InMemoryNotificationRepository, InMemoryProfileRepository,
    InMemoryReviewRepository, SurrealAdoptionRepository, SurrealAppointmentRepository,
    SurrealAuditRepository, SurrealDogRepository, SurrealFavoriteRepository,
    SurrealFollowupRepository, SurrealMessageRepository, SurrealNotificationRepository,
    SurrealProfileRepository, SurrealReviewRepository, connect,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dog_repo: Arc<dyn DogRepository>,
    pub adoption_repo: Arc<dyn AdoptionRepository>,
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub message_repo: Arc<dyn MessageRepository>,
    pub favorite_repo: Arc<dyn FavoriteRepository>,
    pub appointment_repo: Arc<dyn AppointmentRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub followup_repo: Arc<dyn FollowupRepository>,
    pub notification_repo: Arc<dyn NotificationPreferenceRepository>,
    pub audit_repo: Arc<dyn AuditLogRepository>,
    pub auth_service: Option<Arc<SurrealAuthService>>,
    pub message_feed: MessageFeed,
    pub session_hub: SessionHub,
    pub media: Arc<MediaClient>,
    pub mailer: Arc<MailerClient>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        if !config.uses_surreal_backend() {
            return Ok(Self::in_memory(config));
        }

        let db_config = DbConfig::from_app_config(&config);
        SurrealAdapter::new(db_config.clone())
            .health_check()
            .await
            .map_err(|err| anyhow::anyhow!("surreal backend unreachable: {err}"))?;
        let auth_service = Arc::new(SurrealAuthService::new(db_config.clone()).await?);
        let media = Arc::new(MediaClient::from_config(&config));
        let mailer = Arc::new(MailerClient::from_config(&config));

        // All repositories share one root connection.
        let client = connect(&db_config).await?;
        Ok(Self {
            dog_repo: Arc::new(SurrealDogRepository::with_client(client.clone())),
            adoption_repo: Arc::new(SurrealAdoptionRepository::with_client(client.clone())),
            profile_repo: Arc::new(SurrealProfileRepository::with_client(client.clone())),
            message_repo: Arc::new(SurrealMessageRepository::with_client(client.clone())),
            favorite_repo: Arc::new(SurrealFavoriteRepository::with_client(client.clone())),
            appointment_repo: Arc::new(SurrealAppointmentRepository::with_client(client.clone())),
            review_repo: Arc::new(SurrealReviewRepository::with_client(client.clone())),
            followup_repo: Arc::new(SurrealFollowupRepository::with_client(client.clone())),
            notification_repo: Arc::new(SurrealNotificationRepository::with_client(
                client.clone(),
            )),
            audit_repo: Arc::new(SurrealAuditRepository::with_client(client)),
            auth_service: Some(auth_service),
            message_feed: MessageFeed::new(),
            session_hub: SessionHub::new(),
            media,
            mailer,
            config,
        })
    }

    /// Memory backend: also the fixture the API tests run against.
    pub fn in_memory(config: AppConfig) -> Self {
        let dog_repo = InMemoryDogRepository::new();
        let adoption_repo = InMemoryAdoptionRepository::new(dog_repo.handle());
        let media = Arc::new(MediaClient::from_config(&config));
        let mailer = Arc::new(MailerClient::from_config(&config));

        Self {
            dog_repo: Arc::new(dog_repo),
            adoption_repo: Arc::new(adoption_repo),
            profile_repo: Arc::new(InMemoryProfileRepository::new()),
            message_repo: Arc::new(InMemoryMessageRepository::new()),
            favorite_repo: Arc::new(InMemoryFavoriteRepository::new()),
            appointment_repo: Arc::new(InMemoryAppointmentRepository::new()),
            review_repo: Arc::new(InMemoryReviewRepository::new()),
            followup_repo: Arc::new(InMemoryFollowupRepository::new()),
            notification_repo: Arc::new(InMemoryNotificationRepository::new()),
            audit_repo: Arc::new(InMemoryAuditRepository::new()),
            auth_service: None,
            message_feed: MessageFeed::new(),
            session_hub: SessionHub::new(),
            media,
            mailer,
            config,
        }
    }
}
