//! Presentation order
//!
//! Uniform random choice over the whole index. Labeled images are not
//! excluded, so repeats are expected.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ImageIndex;

/// Pick the next image to present, or `None` if the index is empty
pub fn next_image(index: &ImageIndex) -> Option<String> {
    let images = index.list_images();
    choose_image(&images, &mut rand::thread_rng()).cloned()
}

/// Pick one path uniformly at random using the supplied RNG
pub fn choose_image<'a, R: Rng + ?Sized>(images: &'a [String], rng: &mut R) -> Option<&'a String> {
    images.choose(rng)
}
