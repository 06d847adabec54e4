use crate::WorkoutError;

/// Running pace in min/km.
pub fn compute_pace(distance_km: f64, duration_min: f64) -> Result<f64, WorkoutError> {
    if !distance_km.is_finite() || !duration_min.is_finite() || distance_km <= 0. {
        return Err(WorkoutError::InvalidMetricInput(format!(
            "Cannot compute pace from {distance_km} km over {duration_min} min"
        )));
    }

    finite(duration_min / distance_km, "Pace")
}

/// Cycling speed in km/h.
pub fn compute_speed(distance_km: f64, duration_min: f64) -> Result<f64, WorkoutError> {
    if !distance_km.is_finite() || !duration_min.is_finite() || duration_min <= 0. {
        return Err(WorkoutError::InvalidMetricInput(format!(
            "Cannot compute speed from {distance_km} km over {duration_min} min"
        )));
    }

    finite(distance_km / (duration_min / 60.), "Speed")
}

// A finite input can still give an infinite quotient
fn finite(metric: f64, name: &str) -> Result<f64, WorkoutError> {
    if metric.is_finite() {
        Ok(metric)
    } else {
        Err(WorkoutError::InvalidMetricInput(format!("{name} is out of range")))
    }
}
