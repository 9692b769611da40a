//! Score to band mapping
//!
//! Two distinct policies: the headline report band (80/60, exclusive at the
//! top) and the prognosis band used for DAG and task prognoses (90/70).

use crate::models::Band;

/// Band of a report's headline score: Green above 80, Yellow from 60 to 80
/// inclusive, Red below 60
pub fn band_for_score(score: f64) -> Band {
    if score > 80.0 {
        Band::Green
    } else if score >= 60.0 {
        Band::Yellow
    } else {
        Band::Red
    }
}

/// Band of a DAG or task prognosis
pub fn prognosis_band(score: f64) -> Band {
    if score >= 90.0 {
        Band::Green
    } else if score >= 70.0 {
        Band::Yellow
    } else {
        Band::Red
    }
}
