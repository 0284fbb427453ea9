//! Terminal handler return values.

use serde::Serialize;
use serde_json::Value;
use signpost_core::HandlerError;
use signpost_extract::Response;

/// What a terminal handler produced.
#[derive(Debug)]
pub enum Reply {
    /// A response sent as-is.
    Raw(Response),
    /// A value wrapped as `{"status":"ok","data":..}`.
    Data(Value),
}

/// Wrapper that serializes any `T: Serialize` as the `data` of the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

/// Conversion from a terminal handler's return value into a [`Reply`].
pub trait IntoReply {
    /// Performs the conversion.
    fn into_reply(self) -> Result<Reply, HandlerError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(self)
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Raw(self))
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Data(self))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Data(Value::Null))
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        serde_json::to_value(self.0)
            .map(Reply::Data)
            .map_err(|e| HandlerError::internal(format!("failed to serialize handler output: {e}")))
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<HandlerError>,
{
    fn into_reply(self) -> Result<Reply, HandlerError> {
        match self {
            Ok(value) => value.into_reply(),
            Err(error) => Err(error.into()),
        }
    }
}
