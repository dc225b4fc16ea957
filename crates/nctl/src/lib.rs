//! nctl: expose a local port through an ngrok tunnel and point a CloudFront
//! distribution at the tunnel's public URL.

pub mod cloudfront;
pub mod cmd;
pub mod orchestrator;
pub mod shutdown;
pub mod start;
pub mod tunnel;
pub mod update;
pub mod worker;
