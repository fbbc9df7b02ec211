mod canon;
mod record;
mod value;

pub use canon::Canon;
pub use record::Record;
pub use value::Value;
