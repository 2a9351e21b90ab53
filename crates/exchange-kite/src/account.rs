//! Portfolio queries.

use tracing::debug;

use intraday_core::events::{BrokerPosition, ProductKind};

use crate::client::{Bucket, KiteClient};
use crate::error::KiteError;
use crate::types::PositionsResponse;

impl KiteClient {
    /// Net positions under `product` with a non-zero quantity.
    ///
    /// # Errors
    /// Returns error on transport failure or an error envelope.
    pub async fn open_positions(&self, product: ProductKind) -> Result<Vec<BrokerPosition>, KiteError> {
        let data: PositionsResponse = self
            .get("/portfolio/positions", &[], Bucket::General)
            .await?;

        let open: Vec<BrokerPosition> = data
            .net
            .into_iter()
            .filter(|p| p.is_open_under(product))
            .map(BrokerPosition::from)
            .collect();

        debug!(product = %product, open = open.len(), "Positions fetched");
        Ok(open)
    }
}
