use crate::ImageSize;

/// Owned memo for an undistortion map.
///
/// The map depends only on the camera model and the frame size, so one entry
/// keyed by size is enough. A size change replaces the entry.
#[derive(Debug)]
pub struct UndistortionCache<M> {
    entry: Option<(ImageSize, M)>,
    builds: usize,
}

impl<M> Default for UndistortionCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> UndistortionCache<M> {
    pub fn new() -> Self {
        Self {
            entry: None,
            builds: 0,
        }
    }

    /// Return the cached map for `size`, building it with `build` on a miss.
    ///
    /// A failed build leaves the previous entry in place.
    pub fn get_or_try_insert_with<E, B>(&mut self, size: ImageSize, build: B) -> Result<&M, E>
    where
        B: FnOnce(ImageSize) -> Result<M, E>,
    {
        if self.cached_size() != Some(size) {
            let map = build(size)?;
            self.builds += 1;
            log::debug!("built undistortion map for {size}");
            let (_, map) = self.entry.insert((size, map));
            return Ok(&*map);
        }
        match &self.entry {
            Some((_, map)) => Ok(map),
            None => unreachable!("entry is filled for the cached size"),
        }
    }

    pub fn cached_size(&self) -> Option<ImageSize> {
        self.entry.as_ref().map(|(size, _)| *size)
    }

    /// How many times a map has been built over the cache lifetime.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
