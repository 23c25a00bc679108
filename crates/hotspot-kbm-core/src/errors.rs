use thiserror::Error;

/// Failures of the virtual input sink.
#[derive(Error, Debug)]
pub enum InputError {
    #[error(
        "cannot create uinput device: {source}. \
         The server needs write access to /dev/uinput. Run as root, or \
         `sudo modprobe uinput && sudo chmod 0660 /dev/uinput`"
    )]
    DeviceCreation { source: std::io::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the network front-end.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("failed to bind {listener} on port {port}: {source}")]
    Bind {
        listener: &'static str,
        port: u16,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
