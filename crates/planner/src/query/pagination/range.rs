use super::{PaginationError, trim_statement_end};
use chrono::{NaiveDateTime, TimeDelta};
use model::{
    core::value::TIMESTAMP_LAYOUT,
    pagination::params::{ParamValue, names},
};
use tracing::warn;

pub const START_PLACEHOLDER: &str = "{{start}}";
pub const END_PLACEHOLDER: &str = "{{end}}";

/// Walks `[start, end]` in windows of `step`, substituting each window
/// into `{{start}}` and `{{end}}`.
///
/// When start, end and step all parse as integers the arithmetic is
/// integer; otherwise the bounds are `YYYY-MM-DD HH:MM:SS` timestamps and
/// the step is a duration such as `10m` or `1h30m`. The last window ends
/// exactly at `end`; after that the strategy keeps producing `(end, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWindow {
    query: String,
    start: Option<String>,
    end: Option<String>,
    step: Option<String>,
    window: Option<Window>,
}

#[derive(Debug, Clone, PartialEq)]
enum Window {
    Int {
        start: i64,
        end: i64,
        step: i64,
        current: i64,
    },
    Time {
        start: NaiveDateTime,
        end: NaiveDateTime,
        step: TimeDelta,
        current: NaiveDateTime,
    },
}

impl Window {
    fn parse(start: &str, end: &str, step: &str) -> Result<Self, PaginationError> {
        let ints = (
            start.trim().parse::<i64>(),
            end.trim().parse::<i64>(),
            step.trim().parse::<i64>(),
        );
        if let (Ok(start), Ok(end), Ok(step)) = ints {
            if step <= 0 {
                return Err(PaginationError::InvalidStep {
                    step: step.to_string(),
                    reason: "step must be positive".into(),
                });
            }
            return Ok(Window::Int {
                start,
                end,
                step,
                current: start,
            });
        }

        let start = parse_timestamp(start)?;
        let end = parse_timestamp(end)?;
        let step = parse_step(step)?;
        Ok(Window::Time {
            start,
            end,
            step,
            current: start,
        })
    }

    fn rewind(&mut self) {
        match self {
            Window::Int { start, current, .. } => *current = *start,
            Window::Time { start, current, .. } => *current = *start,
        }
    }

    /// Returns the window starting at the cursor and moves the cursor to
    /// the window's end, never past `end`.
    fn advance(&mut self) -> (String, String) {
        match self {
            Window::Int {
                end, step, current, ..
            } => {
                let from = *current;
                let to = from.saturating_add(*step).min(*end);
                if from < *end {
                    *current = to;
                }
                (from.to_string(), to.to_string())
            }
            Window::Time {
                end, step, current, ..
            } => {
                let from = *current;
                let to = from
                    .checked_add_signed(*step)
                    .map_or(*end, |t| t.min(*end));
                if from < *end {
                    *current = to;
                }
                (
                    from.format(TIMESTAMP_LAYOUT).to_string(),
                    to.format(TIMESTAMP_LAYOUT).to_string(),
                )
            }
        }
    }
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, PaginationError> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_LAYOUT)
        .map_err(|_| PaginationError::InvalidBound(text.to_string()))
}

fn parse_step(text: &str) -> Result<TimeDelta, PaginationError> {
    let invalid = |reason: String| PaginationError::InvalidStep {
        step: text.to_string(),
        reason,
    };
    let duration = humantime::parse_duration(text.trim()).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("step must be positive".into()));
    }
    TimeDelta::from_std(duration).map_err(|e| invalid(e.to_string()))
}

impl RangeWindow {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            start: None,
            end: None,
            step: None,
            window: None,
        }
    }

    /// Convenience constructor used when all three parameters are known.
    pub fn with_bounds(
        query: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        step: impl Into<String>,
    ) -> Result<Self, PaginationError> {
        let mut range = Self::new(query);
        range.start = Some(start.into());
        range.end = Some(end.into());
        range.step = Some(step.into());
        range.validate()?;
        Ok(range)
    }

    /// Parses the configured bounds and step. Called by the factory so that
    /// a bad configuration fails before any query runs.
    pub fn validate(&mut self) -> Result<(), PaginationError> {
        let start = self
            .start
            .as_deref()
            .ok_or(PaginationError::MissingParameter(names::START))?;
        let end = self
            .end
            .as_deref()
            .ok_or(PaginationError::MissingParameter(names::END))?;
        let step = self
            .step
            .as_deref()
            .ok_or(PaginationError::MissingParameter(names::STEP))?;
        self.window = Some(Window::parse(start, end, step)?);
        Ok(())
    }

    pub fn reset(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.rewind();
        }
    }

    pub(super) fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), PaginationError> {
        let slot = match name {
            names::START => &mut self.start,
            names::END => &mut self.end,
            names::STEP => &mut self.step,
            _ => return Ok(()),
        };
        *slot = Some(value.to_string());
        self.window = None;
        Ok(())
    }

    pub(super) fn next_query_text(&mut self) -> String {
        if self.window.is_none()
            && let Err(e) = self.validate()
        {
            warn!(error = %e, "Range window is not configured, substituting empty bounds");
        }

        let (from, to) = self
            .window
            .as_mut()
            .map(Window::advance)
            .unwrap_or_default();

        trim_statement_end(&self.query)
            .replace(START_PLACEHOLDER, &from)
            .replace(END_PLACEHOLDER, &to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY: &str = "SELECT * FROM t WHERE id >= {{start}} AND id < {{end}};";

    #[test]
    fn test_integer_windows_have_no_gaps() {
        let mut p = RangeWindow::with_bounds(QUERY, "1", "10", "1").unwrap();
        assert!(matches!(p.window, Some(Window::Int { .. })));

        let mut windows = Vec::new();
        for _ in 0..9 {
            windows.push(p.next_query_text());
        }
        assert_eq!(windows[0], "SELECT * FROM t WHERE id >= 1 AND id < 2");
        assert_eq!(windows[1], "SELECT * FROM t WHERE id >= 2 AND id < 3");
        assert_eq!(windows[8], "SELECT * FROM t WHERE id >= 9 AND id < 10");
        assert!(matches!(p.window, Some(Window::Int { current: 10, end: 10, .. })));
    }

    #[test]
    fn test_final_window_repeats() {
        let mut p = RangeWindow::with_bounds(QUERY, "1", "10", "1").unwrap();
        for _ in 0..9 {
            p.next_query_text();
        }
        let last = "SELECT * FROM t WHERE id >= 10 AND id < 10";
        assert_eq!(p.next_query_text(), last);
        assert_eq!(p.next_query_text(), last);
        assert_eq!(p.next_query_text(), last);
    }

    #[test]
    fn test_uneven_step_is_clamped_to_end() {
        let mut p = RangeWindow::with_bounds("{{start}}-{{end}}", "1", "10", "4").unwrap();
        assert_eq!(p.next_query_text(), "1-5");
        assert_eq!(p.next_query_text(), "5-9");
        assert_eq!(p.next_query_text(), "9-10");
        assert_eq!(p.next_query_text(), "10-10");
    }

    #[test]
    fn test_timestamp_windows() {
        let mut p = RangeWindow::with_bounds(
            "BETWEEN '{{start}}' AND '{{end}}'",
            "2025-01-01 00:00:00",
            "2025-01-01 00:25:00",
            "0h10m",
        )
        .unwrap();
        assert!(matches!(p.window, Some(Window::Time { .. })));

        assert_eq!(
            p.next_query_text(),
            "BETWEEN '2025-01-01 00:00:00' AND '2025-01-01 00:10:00'"
        );
        assert_eq!(
            p.next_query_text(),
            "BETWEEN '2025-01-01 00:10:00' AND '2025-01-01 00:20:00'"
        );
        assert_eq!(
            p.next_query_text(),
            "BETWEEN '2025-01-01 00:20:00' AND '2025-01-01 00:25:00'"
        );
        assert_eq!(
            p.next_query_text(),
            "BETWEEN '2025-01-01 00:25:00' AND '2025-01-01 00:25:00'"
        );
        assert_eq!(
            p.next_query_text(),
            "BETWEEN '2025-01-01 00:25:00' AND '2025-01-01 00:25:00'"
        );
    }

    #[test]
    fn test_reset_rewinds() {
        let mut p = RangeWindow::with_bounds("{{start}}", "5", "8", "1").unwrap();
        p.next_query_text();
        p.next_query_text();
        p.reset();
        assert_eq!(p.next_query_text(), "5");
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(
            RangeWindow::with_bounds(QUERY, "yesterday", "10", "1").unwrap_err(),
            PaginationError::InvalidBound("yesterday".into())
        );
        assert!(matches!(
            RangeWindow::with_bounds(QUERY, "1", "10", "0"),
            Err(PaginationError::InvalidStep { .. })
        ));
        assert!(matches!(
            RangeWindow::with_bounds(QUERY, "2025-01-01 00:00:00", "2025-01-02 00:00:00", "soon"),
            Err(PaginationError::InvalidStep { .. })
        ));

        let mut p = RangeWindow::new(QUERY);
        assert_eq!(
            p.validate().unwrap_err(),
            PaginationError::MissingParameter("start")
        );
    }

    #[test]
    fn test_parameters_accept_numbers() {
        let mut p = RangeWindow::new("{{start}}..{{end}}");
        p.set_parameter("start", ParamValue::Int(0)).unwrap();
        p.set_parameter("end", ParamValue::Int(100)).unwrap();
        p.set_parameter("step", ParamValue::Int(50)).unwrap();
        p.validate().unwrap();
        assert_eq!(p.next_query_text(), "0..50");
        assert_eq!(p.next_query_text(), "50..100");
        assert_eq!(p.next_query_text(), "100..100");
    }
}
