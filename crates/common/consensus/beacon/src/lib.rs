pub mod attestation;
pub mod block;
pub mod checkpoint;
pub mod constants;
pub mod latest_message;
pub mod misc;
pub mod state;
pub mod validator;
