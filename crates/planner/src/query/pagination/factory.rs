use super::{LimitOffset, OrderById, Pagination, PaginationError, RangeWindow, Simple};
use model::pagination::{kind::PaginationKind, params::ParamValue};
use std::collections::HashMap;
use tracing::debug;

impl Pagination {
    /// Builds the strategy for `kind` over `query` and applies the initial
    /// parameters. Range bounds are parsed here, so a misconfigured range
    /// is reported before the first query is generated.
    pub fn from_kind(
        kind: PaginationKind,
        query: &str,
        params: &HashMap<String, ParamValue>,
    ) -> Result<Self, PaginationError> {
        let mut pagination = match kind {
            PaginationKind::Simple => Pagination::Simple(Simple::new(query)),
            PaginationKind::LimitOffset => Pagination::LimitOffset(LimitOffset::new(query)),
            PaginationKind::OrderById => Pagination::OrderById(OrderById::new(query)),
            PaginationKind::Range => Pagination::Range(RangeWindow::new(query)),
        };

        for (name, value) in params {
            pagination.set_parameter(name, value.clone())?;
        }

        if let Pagination::Range(range) = &mut pagination {
            range.validate()?;
        }

        debug!(kind = %kind, params = params.len(), "Pagination strategy created");
        Ok(pagination)
    }
}
