use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Value processor for quoted settings such as `dataset = "tmall"`.
///
/// Removes one pair of double quotes enclosing the whole value. Anything else, a lone `"`
/// included, passes through untouched.
pub trait Unquote
where
    Self: Sized,
{
    fn unquote(self) -> Result<StringItem, ConfigError>;
}

impl Unquote for Result<StringItem, ConfigError> {
    fn unquote(self) -> Result<StringItem, ConfigError> {
        self?.map(|value| {
            let value = value.trim();
            if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                MapAction::Replace(vec![value[1..value.len() - 1].to_owned()])
            } else {
                MapAction::Keep
            }
        })
    }
}
