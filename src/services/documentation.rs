use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live round backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::round::create_round,
        crate::routes::round::list_rounds,
        crate::routes::round::get_round,
        crate::routes::round::load_round,
        crate::routes::round::complete_round,
        crate::routes::round::abandon_round,
        crate::routes::scoring::record_stroke,
        crate::routes::scoring::record_hole_stats,
        crate::routes::scoring::skip_hole_stats,
        crate::routes::scoring::enable_stat_prompts,
        crate::routes::transfer::voluntary_transfer,
        crate::routes::transfer::request_transfer,
        crate::routes::transfer::approve_transfer,
        crate::routes::transfer::decline_transfer,
        crate::routes::spectator::leaderboard,
        crate::routes::chat::post_message,
        crate::routes::chat::list_messages,
        crate::routes::sse::round_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::round::CreateRoundRequest,
            crate::dto::round::RoundSnapshot,
            crate::dto::round::RoundListItem,
            crate::dto::round::LeaderboardResponse,
            crate::dto::scoring::RecordStrokeRequest,
            crate::dto::scoring::RecordHoleStatsRequest,
            crate::dto::scoring::MarkerActionRequest,
            crate::dto::transfer::RequestTransferRequest,
            crate::dto::transfer::ResolveTransferRequest,
            crate::dto::transfer::VoluntaryTransferRequest,
            crate::dto::chat::PostChatMessageRequest,
            crate::dto::chat::ChatMessageSummary,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "round", description = "Round lifecycle operations"),
        (name = "scoring", description = "Marker-side score and stat entry"),
        (name = "transfer", description = "Marker-transfer protocol"),
        (name = "spectator", description = "Read-only observer projections"),
        (name = "chat", description = "Round chat log"),
        (name = "sse", description = "Server-sent event streams"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
