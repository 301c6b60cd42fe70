pub(crate) mod buffers;
pub(crate) mod init;
pub(crate) mod kernel;
pub(crate) mod stepper;
pub(crate) mod types;
