use calib_video_core::{CalibError, ImageSize};

/// A decoded frame whose pixel dimensions can be queried.
pub trait Raster {
    fn image_size(&self) -> Result<ImageSize, CalibError>;
}

/// Sequential, blocking supplier of video frames.
///
/// `Ok(None)` means the source is exhausted. Implementations release their
/// underlying handle on drop.
pub trait FrameSource {
    type Frame: Raster;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>, CalibError>;
}

/// Adapts any iterator of frames into a [`FrameSource`].
#[derive(Clone, Debug)]
pub struct FrameIter<I> {
    inner: I,
}

impl<I> FrameIter<I> {
    pub fn new<T>(frames: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            inner: frames.into_iter(),
        }
    }
}

impl<I> FrameSource for FrameIter<I>
where
    I: Iterator,
    I::Item: Raster,
{
    type Frame = I::Item;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>, CalibError> {
        Ok(self.inner.next())
    }
}
