//! Route paths served by the API router.

pub const GET_ROOT: &str = "/";
pub const POST_CHAT: &str = "/chat";
/// Path used by the first deployed clients; kept as an alias of [`POST_CHAT`].
pub const POST_API_CHAT: &str = "/api/chat";
pub const GET_SCENARIOS: &str = "/scenarios";
pub const POST_WELCOME: &str = "/welcome";
