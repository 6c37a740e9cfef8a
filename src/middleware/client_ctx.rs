use crate::session::authenticate_client_by_session;
use crate::user::{gravatar_url, ClientUser, DEFAULT_AVATAR_SIZE};
use crate::web::comment::CommentForTemplate;
use crate::web::twit::TwitForTemplate;
use actix_session::Session;
use actix_utils::future::{ok, Ready};
use actix_web::dev::{
    forward_ready, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::time::{Duration, Instant};
use std::{cell::RefCell, rc::Rc};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    pub client: Option<ClientUser>,
    pub request_start: Instant,
}

impl ClientCtxInner {
    fn new() -> Self {
        Self {
            client: None,
            request_start: Instant::now(),
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Rc<RefCell<ClientCtxInner>>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(ClientCtxInner::new())))
    }
}

impl ClientCtx {
    fn get_client_ctx(extensions: &mut Extensions) -> Self {
        match extensions.get::<Rc<RefCell<ClientCtxInner>>>() {
            // Existing record in extensions; pull it.
            Some(s_impl) => Self(Rc::clone(s_impl)),
            // No existing record; create and insert it.
            None => {
                let inner = Rc::new(RefCell::new(ClientCtxInner::new()));
                extensions.insert(inner.clone());
                Self(inner)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.borrow().client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    /// TODO: l10n "Guest"
    pub fn get_name(&self) -> String {
        match &self.0.borrow().client {
            Some(user) => user.username.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.0.borrow().client.is_some()
    }

    pub fn avatar_url(&self) -> String {
        match &self.0.borrow().client {
            Some(user) => user.avatar_url(DEFAULT_AVATAR_SIZE),
            None => gravatar_url("", DEFAULT_AVATAR_SIZE),
        }
    }

    /// Link to the client's own profile, or to login for guests.
    pub fn profile_url(&self) -> String {
        match self.get_id() {
            Some(id) => format!("/accounts/profile/{}/", id),
            None => "/accounts/login/".to_owned(),
        }
    }

    /// Drops the resolved identity for the rest of the request cycle.
    /// Logout uses this so its own page renders as a guest.
    pub fn clear(&self) {
        self.0.borrow_mut().client = None;
    }

    pub fn can_update_twit(&self, twit: &TwitForTemplate) -> bool {
        self.is_user() && self.get_id() == Some(twit.user_id)
    }

    pub fn can_delete_twit(&self, twit: &TwitForTemplate) -> bool {
        self.is_user() && self.get_id() == Some(twit.user_id)
    }

    pub fn can_update_comment(&self, comment: &CommentForTemplate) -> bool {
        self.is_user() && self.get_id() == Some(comment.user_id)
    }

    pub fn can_delete_comment(&self, comment: &CommentForTemplate) -> bool {
        self.is_user() && self.get_id() == Some(comment.user_id)
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.borrow().request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ok(ClientCtx::get_client_ctx(&mut req.extensions_mut()))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ClientCtxMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ClientCtxMiddleware {
            service,
            inner: self.0.clone(),
        })
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: S,
    #[allow(dead_code)]
    inner: Rc<RefCell<ClientCtxInner>>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Borrows of `req` must be done in a precise way to avoid conflicts. This order is important.
        let (httpreq, payload) = req.into_parts();
        let cookies = Session::extract(&httpreq).into_inner();
        let req = ServiceRequest::from_parts(httpreq, payload);
        let ctx = ClientCtx::get_client_ctx(&mut req.extensions_mut());
        let fut = self.service.call(req);

        async move {
            match cookies {
                Ok(cookies) => {
                    // Assign the user to our ClientCtx struct.
                    ctx.0.borrow_mut().client = authenticate_client_by_session(&cookies).await;
                }
                Err(e) => {
                    log::error!("ClientCtxMiddleware: Session::extract(): {}", e);
                }
            };
            Ok(fut.await?)
        }
        .boxed_local()
    }
}
