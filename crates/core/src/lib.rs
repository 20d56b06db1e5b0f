pub mod admission;
pub mod config;
pub mod encoder;
pub mod gallery;
pub mod job;
pub mod lifecycle;
pub mod metrics;
pub mod notify;
pub mod publish;
pub mod resolver;
pub mod runner;
pub mod still;
pub mod testing;
pub mod upscale;
pub mod workspace;

pub use admission::{
    AdmissionConfig, AdmissionController, AdmissionTicket, BusyReason, InFlightJob, Rejection,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use encoder::{
    EncodeError, EncodeOutcome, EncodeRequest, EncoderConfig, FfmpegEncoder,
    SizeConstrainedEncoder, VideoEncoder,
};
pub use gallery::{AssetMetadata, FrameRef, Gallery, GalleryConfig, GalleryError, HttpGallery};
pub use job::{Job, JobPhase, OptionFlags, RequesterId, SourceId};
pub use lifecycle::{
    parse_command, CancelOutcome, ChatCommand, CommandOutcome, CreateOutcome, CreateRequest,
    JobManager, LifecycleError, SessionConfig, SessionState,
};
pub use notify::{InboxNotifier, MultiNotifier, Notice, Notifier, StoredNotice};
pub use publish::{
    HttpRegistry, PublishError, PublishedSet, RegistryConfig, RegistryError, SetPublisher,
    StickerFormat, StickerInput, StickerPublisher, StickerRecord, StickerRegistry,
    TelegramClient, TelegramConfig,
};
pub use resolver::{Frame, FrameSet, FrameSourceResolver, Rendering, ResolveError, ResolverConfig};
pub use runner::{
    ArtifactKind, CompletedJob, EncodedArtifact, ItemKind, JobError, JobRunner, PhaseCallback,
    RunnerConfig, SourceAsset,
};
pub use still::{CompressError, CompressionPolicy};
pub use upscale::{create_upscaler, Upscaler, UpscalerBackend, UpscalerConfig, UpscaleError};
pub use workspace::{JobWorkspace, Workspace, WorkspaceConfig};
