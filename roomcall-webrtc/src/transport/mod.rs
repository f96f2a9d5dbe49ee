mod codec;
mod convert;
mod rtc_agent;
mod rtc_factory;

pub use rtc_agent::RtcAgent;
pub use rtc_factory::RtcAgentFactory;
