//! Observation log filled by injections and annotated by the experimenter.
//!
//! Each completed injection appends one row. The measured `response` is typed
//! in later by the user, and `percent_response` is derived from it and the
//! current maximum response. Both are kept as strings in the row because the
//! log round-trips through hosts that store it as entered.

#[cfg(test)]
#[path = "observations_test.rs"]
mod observations_test;

use serde::{Deserialize, Serialize};

/// Error returned by observation edits.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ObservationError {
    #[error("no observation with sequence number {0}")]
    UnknownEntry(u32),
}

/// One row of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// 1-based sequence number.
    pub s_no: u32,
    /// Stock concentration injected.
    pub concentration: f64,
    /// Volume added to the bath.
    pub amount_added: f64,
    /// Resulting bath concentration.
    pub conc_in_bath: f64,
    /// Measured response; empty until entered.
    pub response: String,
    /// `100 * response / max_response`, or empty while either is unknown.
    pub percent_response: String,
}

/// Ordered observations plus the chart cursor.
#[derive(Debug, Clone, Default)]
pub struct ObservationLog {
    entries: Vec<Observation>,
    max_response: Option<f64>,
    /// Index of the next point on the response graph.
    graph_position: usize,
}

impl ObservationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn max_response(&self) -> Option<f64> {
        self.max_response
    }

    #[must_use]
    pub fn graph_position(&self) -> usize {
        self.graph_position
    }

    /// Append a row for a completed injection and advance the graph cursor.
    pub fn record_injection(&mut self, concentration: f64, amount_added: f64, conc_in_bath: f64) -> &Observation {
        let s_no = u32::try_from(self.entries.len() + 1).unwrap_or(u32::MAX);
        self.entries.push(Observation {
            s_no,
            concentration,
            amount_added,
            conc_in_bath,
            response: String::new(),
            percent_response: String::new(),
        });
        self.graph_position += 1;
        tracing::info!(s_no, conc_in_bath, "observation recorded");
        &self.entries[self.entries.len() - 1]
    }

    /// Enter the measured response for a row and recompute every percentage.
    ///
    /// # Errors
    ///
    /// [`ObservationError::UnknownEntry`] if no row has this sequence number.
    pub fn set_response(&mut self, s_no: u32, response: &str) -> Result<(), ObservationError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.s_no == s_no)
            .ok_or(ObservationError::UnknownEntry(s_no))?;
        entry.response = response.trim().to_owned();
        self.recompute();
        Ok(())
    }

    /// Set or clear the maximum response and recompute every percentage.
    pub fn set_max_response(&mut self, max_response: Option<f64>) {
        self.max_response = max_response.filter(|m| m.is_finite() && *m != 0.0);
        self.recompute();
    }

    /// Recompute `percent_response` for the whole list.
    pub fn recompute(&mut self) {
        let max = self.max_response;
        for entry in &mut self.entries {
            entry.percent_response = percent_of(&entry.response, max);
        }
    }

    /// Drop all rows and rewind the graph cursor. The maximum response is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.graph_position = 0;
    }
}

fn percent_of(response: &str, max_response: Option<f64>) -> String {
    let Some(max) = max_response else {
        return String::new();
    };
    match response.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{:.2}", 100.0 * value / max),
        _ => String::new(),
    }
}
