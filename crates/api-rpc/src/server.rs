//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP (jsonrpsee).

use crate::handler::RpcHandler;
use crate::types::{
    FundRequest, FundsListRequest, MaintenanceRequest, RefreshRequest, StatsRequest,
    SummaryRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// Methods served by `RpcServer`
pub const METHODS: &[&str] = &[
    "funds.list.v1",
    "fund.summary.v1",
    "fund.analysis.v1",
    "fund.chart.v1",
    "cache.refresh.v1",
    "admin.stats.v1",
    "admin.maintenance.v1",
];

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Parse params that may be omitted entirely (`null` / absent -> default)
fn parse_optional<T: DeserializeOwned + Default>(
    params: Params<'_>,
) -> Result<T, ErrorObjectOwned> {
    Ok(params.parse::<Option<T>>()?.unwrap_or_default())
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: Arc<RpcHandler>) -> Self {
        Self { config, handler }
    }

    /// Build the method table
    pub fn module(handler: Arc<RpcHandler>) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let h = handler.clone();
        module
            .register_async_method("funds.list.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: FundsListRequest = parse_optional(params)?;
                    handler.funds_list(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let h = handler.clone();
        module
            .register_async_method("fund.summary.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: SummaryRequest = parse_optional(params)?;
                    handler.summary(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let h = handler.clone();
        module
            .register_async_method("fund.analysis.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: FundRequest = params.parse()?;
                    handler.analysis(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let h = handler.clone();
        module
            .register_async_method("fund.chart.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: FundRequest = params.parse()?;
                    handler.chart(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let h = handler.clone();
        module
            .register_async_method("cache.refresh.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: RefreshRequest = parse_optional(params)?;
                    handler.refresh(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let h = handler.clone();
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: StatsRequest = parse_optional(params)?;
                    handler.stats(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let h = handler;
        module
            .register_async_method("admin.maintenance.v1", move |params, _, _| {
                let handler = h.clone();
                async move {
                    let req: MaintenanceRequest = parse_optional(params)?;
                    handler.maintenance(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Bind and start serving; returns the bound address and the stop handle
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = Self::module(self.handler)?;
        let handle = server.start(module);

        info!(addr = %local_addr, methods = METHODS.len(), "JSON-RPC server started");
        Ok((local_addr, handle))
    }
}
