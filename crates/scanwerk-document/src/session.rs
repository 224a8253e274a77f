// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The working set of source images waiting to be assembled.

use rayon::prelude::*;
use scanwerk_core::SourceId;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument, warn};

use crate::codec;
use crate::raster::RasterBuffer;
use crate::scan::EnhancementPipeline;

/// One image in the working set.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: SourceId,
    /// Display name, usually the file name it came from.
    pub name: String,
    pub original: RasterBuffer,
    /// Scan-enhanced copy, if the pipeline has been run.
    pub enhanced: Option<RasterBuffer>,
    /// Position key; lower sorts first, ties keep insertion order.
    pub order: i64,
}

impl SourceImage {
    /// The buffer that goes on the page: the enhanced copy when enhancement
    /// is enabled and one exists, otherwise the original.
    pub fn page_buffer(&self, enhancement_enabled: bool) -> &RasterBuffer {
        match (&self.enhanced, enhancement_enabled) {
            (Some(enhanced), true) => enhanced,
            _ => &self.original,
        }
    }
}

/// Outcome of [`Session::add_encoded_batch`].
#[derive(Debug, Default)]
pub struct BatchAdd {
    pub added: Vec<SourceId>,
    /// `DecodeFailure`s, indexed by position in the batch.
    pub failures: Vec<ScanwerkError>,
}

/// Owns the source images of one assembly job.
#[derive(Debug, Default)]
pub struct Session {
    images: Vec<SourceImage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceImage> {
        self.images.iter().find(|img| img.id == id)
    }

    /// Append a decoded image at the end of the order.
    pub fn add(&mut self, name: impl Into<String>, buffer: RasterBuffer) -> SourceId {
        let id = SourceId::new();
        let order = self.next_order();
        let name = name.into();
        debug!(
            %id,
            %name,
            order,
            width = buffer.width(),
            height = buffer.height(),
            "Image added"
        );
        self.images.push(SourceImage {
            id,
            name,
            original: buffer,
            enhanced: None,
            order,
        });
        id
    }

    /// Decode `bytes` (any format the `image` crate reads) and append it.
    pub fn add_encoded(&mut self, name: impl Into<String>, bytes: &[u8]) -> Result<SourceId> {
        let index = self.images.len();
        let buffer = codec::decode(bytes).map_err(|err| ScanwerkError::DecodeFailure {
            index,
            reason: err.to_string(),
        })?;
        Ok(self.add(name, buffer))
    }

    /// Decode and append several images. Undecodable items are skipped and
    /// reported; the rest are still added, in batch order.
    #[instrument(skip_all)]
    pub fn add_encoded_batch<N, B>(&mut self, items: impl IntoIterator<Item = (N, B)>) -> BatchAdd
    where
        N: Into<String>,
        B: AsRef<[u8]>,
    {
        let mut outcome = BatchAdd::default();
        for (index, (name, bytes)) in items.into_iter().enumerate() {
            let name = name.into();
            match codec::decode(bytes.as_ref()) {
                Ok(buffer) => outcome.added.push(self.add(name, buffer)),
                Err(err) => {
                    warn!(index, %name, error = %err, "Skipping undecodable image");
                    outcome.failures.push(ScanwerkError::DecodeFailure {
                        index,
                        reason: format!("{}: {}", name, err),
                    });
                }
            }
        }
        info!(
            added = outcome.added.len(),
            failed = outcome.failures.len(),
            "Batch ingested"
        );
        outcome
    }

    pub fn remove(&mut self, id: SourceId) -> Option<SourceImage> {
        let position = self.images.iter().position(|img| img.id == id)?;
        Some(self.images.remove(position))
    }

    /// Images in page order: ascending `order`, ties in insertion order.
    pub fn ordered(&self) -> Vec<&SourceImage> {
        let mut view: Vec<&SourceImage> = self.images.iter().collect();
        view.sort_by_key(|img| img.order);
        view
    }

    pub fn set_order(&mut self, id: SourceId, order: i64) -> bool {
        match self.images.iter_mut().find(|img| img.id == id) {
            Some(img) => {
                img.order = order;
                true
            }
            None => false,
        }
    }

    /// Swap with the previous image in page order. False if already first
    /// or unknown.
    pub fn move_up(&mut self, id: SourceId) -> bool {
        let ids = self.ordered_ids();
        match ids.iter().position(|&other| other == id) {
            Some(pos) if pos > 0 => self.swap_positions(&ids, pos - 1, pos),
            _ => false,
        }
    }

    /// Swap with the next image in page order. False if already last or
    /// unknown.
    pub fn move_down(&mut self, id: SourceId) -> bool {
        let ids = self.ordered_ids();
        match ids.iter().position(|&other| other == id) {
            Some(pos) if pos + 1 < ids.len() => self.swap_positions(&ids, pos, pos + 1),
            _ => false,
        }
    }

    /// Run the enhancement pipeline over every image, replacing any previous
    /// enhanced copy.
    #[instrument(skip_all, fields(images = self.images.len()))]
    pub fn enhance_all(&mut self, pipeline: &EnhancementPipeline) {
        self.images.par_iter_mut().for_each(|img| {
            img.enhanced = Some(pipeline.enhance(&img.original));
        });
        info!("Working set enhanced");
    }

    pub fn clear_enhancements(&mut self) {
        for img in &mut self.images {
            img.enhanced = None;
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Key one past the current maximum. When the maximum is `i64::MAX` the
    /// existing keys are renumbered densely first, keeping page order.
    fn next_order(&mut self) -> i64 {
        let Some(max) = self.images.iter().map(|img| img.order).max() else {
            return 0;
        };
        max.checked_add(1).unwrap_or_else(|| {
            let ids = self.ordered_ids();
            for (rank, id) in ids.iter().enumerate() {
                self.set_order(*id, rank as i64);
            }
            warn!(images = ids.len(), "Order keys exhausted; renumbered");
            ids.len() as i64
        })
    }

    fn ordered_ids(&self) -> Vec<SourceId> {
        self.ordered().into_iter().map(|img| img.id).collect()
    }

    /// Swap the page positions `a < b` of the ordered view `ids`.
    ///
    /// Order keys are renumbered densely first so that equal keys cannot make
    /// the swap a no-op.
    fn swap_positions(&mut self, ids: &[SourceId], a: usize, b: usize) -> bool {
        for (rank, id) in ids.iter().enumerate() {
            let key = match rank {
                r if r == a => b,
                r if r == b => a,
                r => r,
            };
            self.set_order(*id, key as i64);
        }
        true
    }
}
