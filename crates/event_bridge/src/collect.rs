use futures::{
    stream::{Collect, TryCollect},
    Stream, StreamExt, TryStream, TryStreamExt,
};

/// Materializes an asynchronous sequence, preserving emission order.
pub trait SequenceExt: Stream {
    /// Pulls until end-of-sequence. Never resolves for an infinite sequence.
    fn drain(self) -> Collect<Self, Vec<Self::Item>>
    where
        Self: Sized,
    {
        self.collect()
    }

    /// Like [`SequenceExt::drain`], but stops at the first error the sequence
    /// reports and resolves to that error.
    fn try_drain(self) -> TryCollect<Self, Vec<<Self as TryStream>::Ok>>
    where
        Self: TryStream + Sized,
    {
        self.try_collect()
    }
}

impl<S: Stream + ?Sized> SequenceExt for S {}

#[cfg(test)]
#[path = "tests/collect_tests.rs"]
mod tests;
