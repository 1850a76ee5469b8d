//! WebSocket 接入网关
//!
//! 负责连接准入：握手、限流、凭证校验，随后把连接拆分为
//! 独立的读循环与写任务。认证失败的连接以策略关闭帧拒绝，
//! 不会进入注册表。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};

use crate::application::services::ConnectionService;
use crate::config::GatewayConfig;
use crate::domain::repository::TokenVerifier;
use crate::infrastructure::presence::ConnectionHandle;
use crate::interface::connection::EventDispatcher;
use crate::metrics::GatewayMetrics;

/// 聊天接入网关
pub struct ChatGateway {
    verifier: Arc<dyn TokenVerifier>,
    connections: Arc<ConnectionService>,
    dispatcher: Arc<EventDispatcher>,
    metrics: Arc<GatewayMetrics>,
    config: Arc<GatewayConfig>,
}

impl ChatGateway {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        connections: Arc<ConnectionService>,
        dispatcher: Arc<EventDispatcher>,
        metrics: Arc<GatewayMetrics>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            verifier,
            connections,
            dispatcher,
            metrics,
            config,
        }
    }

    /// 运行接入循环，每条入站连接一个独立任务
    pub async fn run(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = listener
                .accept()
                .await
                .context("Failed to accept TCP connection")?;

            let gateway = self.clone();
            tokio::spawn(async move {
                if let Err(err) = gateway.accept_connection(stream).await {
                    debug!(peer_addr = %peer_addr, ?err, "Connection terminated");
                }
            });
        }
    }

    /// 处理单条连接的完整生命周期
    ///
    /// 握手与凭证校验受认证超时约束，悬挂的握手不会
    /// 无限占用接入任务
    async fn accept_connection(&self, stream: TcpStream) -> Result<()> {
        if self.connections.active_connections() >= self.config.max_connections {
            warn!(
                max_connections = self.config.max_connections,
                "Connection limit reached, rejecting connection"
            );
            return Ok(());
        }

        // 握手回调里抓取升级请求携带的 token
        let token_slot: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let slot = token_slot.clone();
        let callback = move |request: &Request, response: Response| {
            let token = request.uri().query().and_then(token_from_query);
            if let Ok(mut guard) = slot.lock() {
                *guard = token;
            }
            Ok::<_, ErrorResponse>(response)
        };

        let auth_timeout = Duration::from_secs(self.config.auth_timeout_secs);
        let mut ws = tokio::time::timeout(auth_timeout, accept_hdr_async(stream, callback))
            .await
            .context("WebSocket handshake timed out")?
            .context("WebSocket handshake failed")?;

        let token = token_slot
            .lock()
            .map_err(|_| anyhow!("Token slot lock poisoned"))?
            .take();

        let user = match token {
            Some(token) => match self.verifier.verify(&token).await {
                Ok(user) => user,
                Err(err) => {
                    self.metrics.auth_failures_total.inc();
                    warn!(?err, "Rejecting connection with invalid token");
                    let _ = ws
                        .close(Some(CloseFrame {
                            code: CloseCode::Policy,
                            reason: "Authentication failed".into(),
                        }))
                        .await;
                    return Ok(());
                }
            },
            None => {
                self.metrics.auth_failures_total.inc();
                warn!("Rejecting connection without token");
                let _ = ws
                    .close(Some(CloseFrame {
                        code: CloseCode::Policy,
                        reason: "Authentication required".into(),
                    }))
                    .await;
                return Ok(());
            }
        };

        let (mut ws_sender, mut ws_receiver) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Arc::new(ConnectionHandle::new(user.id, user.name, tx));

        self.connections.handle_connect(handle.clone());
        info!(
            user_id = handle.user_id,
            connection_id = %handle.connection_id,
            "WebSocket session started"
        );

        // 写任务：把出站事件序列化为文本帧
        let connection_id = handle.connection_id.clone();
        let writer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(connection_id = %connection_id, ?err, "Failed to encode event");
                        continue;
                    }
                };
                if ws_sender.send(WsMessage::text(text)).await.is_err() {
                    break;
                }
            }
        });

        // 读循环：连接的读端关闭即视为断开
        while let Some(frame) = ws_receiver.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => self.dispatcher.dispatch(&handle, &text),
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    debug!(
                        connection_id = %handle.connection_id,
                        ?err,
                        "WebSocket read error"
                    );
                    break;
                }
            }
        }

        self.connections
            .handle_disconnect(handle.user_id, &handle.connection_id);
        writer.abort();

        info!(
            user_id = handle.user_id,
            connection_id = %handle.connection_id,
            "WebSocket session ended"
        );
        Ok(())
    }
}

/// 从升级请求的查询串里提取 token 参数
fn token_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}
