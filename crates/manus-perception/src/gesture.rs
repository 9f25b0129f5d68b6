//! Threshold-based gesture classifier.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! | # | Condition | Gesture |
//! |---|---|---|
//! | 1 | index `<= 0.40`, every other finger `> 0.40` | [`Gesture::Point`] |
//! | 2 | middle `<= 0.40`, every other finger `> 0.40` | [`Gesture::ObsceneGesture`] |
//! | 3 | thumb `<= 0.50`, every other finger `> 0.40` | [`Gesture::ThumbsUp`] |
//! | 4 | every finger `> 0.40` | [`Gesture::Fist`] |
//! | 5 | otherwise | [`Gesture::Default`] |
//!
//! A value equal to a threshold satisfies the `<=` side.  The classifier
//! keeps no state between calls.

use manus_types::{FINGER_COUNT, Finger, Gesture};

/// Bend threshold used for every finger except the thumb rule.
pub const FINGER_THRESHOLD: f32 = 0.40;

/// Bend threshold for the thumb in the thumbs-up rule.
pub const THUMB_THRESHOLD: f32 = 0.50;

/// Classify five bend values (thumb first) into a [`Gesture`].
pub fn classify(bend: &[f32; FINGER_COUNT]) -> Gesture {
    let at_most = |finger: Finger, threshold: f32| bend[finger.index()] <= threshold;

    if at_most(Finger::Index, FINGER_THRESHOLD) && others_above(bend, Finger::Index) {
        Gesture::Point
    } else if at_most(Finger::Middle, FINGER_THRESHOLD) && others_above(bend, Finger::Middle) {
        Gesture::ObsceneGesture
    } else if at_most(Finger::Thumb, THUMB_THRESHOLD) && others_above(bend, Finger::Thumb) {
        Gesture::ThumbsUp
    } else if bend.iter().all(|&b| b > FINGER_THRESHOLD) {
        Gesture::Fist
    } else {
        Gesture::Default
    }
}

/// `true` when every finger except `skip` is strictly above
/// [`FINGER_THRESHOLD`].
fn others_above(bend: &[f32; FINGER_COUNT], skip: Finger) -> bool {
    Finger::ALL
        .iter()
        .filter(|&&f| f != skip)
        .all(|&f| bend[f.index()] > FINGER_THRESHOLD)
}
