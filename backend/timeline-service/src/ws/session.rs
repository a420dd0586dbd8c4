//! WebSocket session actor for the push channel.
//!
//! One actor per open connection. Outbound frames arrive through the fanout
//! hub's per-connection channel, bridged into the actor mailbox by a
//! forwarding task. Inbound text frames take the opaque relay path. A
//! heartbeat closes connections whose client stopped responding; the next
//! failed send would catch them anyway, the heartbeat just does it sooner.

use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};

use crate::state::AppState;
use crate::ws::{ConnectionId, FanoutHub};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound frame bridged from the hub's channel into the actor mailbox
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct OutboundFrame(String);

/// Push channel session actor
struct PushSession {
    id: ConnectionId,
    hub: FanoutHub,
    hb: Instant,
}

impl PushSession {
    fn new(id: ConnectionId, hub: FanoutHub) -> Self {
        Self {
            id,
            hub,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                warn!("push connection {:?} heartbeat timed out", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for PushSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("push session started for connection {:?}", self.id);
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("push session stopped for connection {:?}", self.id);

        let hub = self.hub.clone();
        let id = self.id;
        actix::spawn(async move {
            hub.unregister(id).await;
        });
    }
}

impl Handler<OutboundFrame> for PushSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PushSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                let hub = self.hub.clone();
                let id = self.id;
                actix::spawn(async move {
                    hub.relay(id, text.to_string()).await;
                });
            }
            Ok(ws::Message::Binary(_)) => {
                debug!("binary push frames not supported, dropping");
            }
            Ok(ws::Message::Close(reason)) => {
                debug!("push connection {:?} closed: {:?}", self.id, reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// HTTP handler upgrading to the push channel.
pub async fn push_channel(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (id, mut rx) = state.hub.register().await;

    let session = PushSession::new(id, state.hub.clone());
    let (addr, resp) = ws::WsResponseBuilder::new(session, &req, stream).start_with_addr()?;

    // Bridge the hub's outbound channel into the actor mailbox. The task
    // ends when the hub drops the sender (unregister) or the actor dies.
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if addr.try_send(OutboundFrame(frame)).is_err() {
                break;
            }
        }
    });

    Ok(resp)
}
