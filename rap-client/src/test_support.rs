//! Scripted peer for exercising the client without a server.

use rap_protocol::{Codec, Command, Profile, Response};
use rap_transport::{PairedTransport, Transport};
use std::thread::{self, JoinHandle};

pub enum Reply {
    Respond(Response),
    Raw(Vec<u8>),
    Silent,
}

/// Answers each decoded command with whatever `reply` returns, until the
/// client end is dropped.
pub fn spawn_responder<F>(profile: Profile, mut transport: PairedTransport, mut reply: F) -> JoinHandle<()>
where
    F: FnMut(Command) -> Reply + Send + 'static,
{
    let codec = Codec::new(profile, transport.max_message_size()).unwrap();
    thread::spawn(move || {
        while let Ok(message) = transport.recv() {
            let command = codec.decode_command(&message).unwrap();
            let frame = match reply(command) {
                Reply::Respond(response) => codec.encode_response(&response).unwrap().to_vec(),
                Reply::Raw(bytes) => bytes,
                Reply::Silent => continue,
            };
            if transport.send(&frame).is_err() {
                break;
            }
        }
    })
}
