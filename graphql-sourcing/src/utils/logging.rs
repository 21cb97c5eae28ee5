/// A wrapper around `tracing::trace!` that tags an event with the name of the data structure it
/// captures, so that log tooling can follow how compiled documents evolve through the pipeline.
///
/// Pass the tag, the printed value, and a message literal. EX:
/// ```ignore
/// snapshot!("CompiledDocument", document.to_string(), "pruned duplicate fragments");
/// // Generates:
/// // trace!(snapshot = "CompiledDocument", data = document.to_string(), "pruned duplicate fragments");
/// ```
/// Events are only emitted with the `snapshot_tracing` feature, and the value is not evaluated
/// otherwise.
macro_rules! snapshot {
    ($name:literal, $value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(snapshot = $name, data = %$value, $msg);
    };
}

pub(crate) use snapshot;
