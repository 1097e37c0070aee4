//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs. Anything more
//! than a line or two of logic belongs in `bean_engine`.
//!
//! Routes that act for a user take an [`AuthenticatedUser`] argument. The user id always comes from the verified
//! access token; it is never read from the path, query or body.
//!
//! Handlers must not block the worker thread. Every database or processor call is awaited.
use actix_web::{get, web, HttpResponse, Responder};
use bean_engine::{
    db_types::{BeanUpdate, NewBean, NewProfile},
    helpers::VerifiedPayload,
    traits::{CartManagement, CatalogManagement, FulfilmentDatabase, ProfileManagement},
    CartApi,
    CatalogApi,
    OrderFlowApi,
    ProfileApi,
};
use log::*;

use crate::{
    auth::AuthenticatedUser,
    config::ProcessorConfig,
    data_objects::{AddCartItemRequest, CheckoutResponse, JsonResponse, SetQuantityRequest},
    errors::ServerError,
    processor::PaymentProcessor,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(list_beans => Get "/beans" impl CatalogManagement);
/// Lists every bean in the catalog. This route is unauthenticated.
pub async fn list_beans<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET beans");
    let beans = api.beans().await?;
    Ok(HttpResponse::Ok().json(beans))
}

route!(get_bean => Get "/beans/{id}" impl CatalogManagement);
pub async fn get_bean<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET bean #{id}");
    let bean = api.bean(id).await?;
    Ok(HttpResponse::Ok().json(bean))
}

route!(create_bean => Post "/beans" impl CatalogManagement);
/// Lists a new bean for sale. The caller becomes the owner of the listing.
pub async fn create_bean<B: CatalogManagement>(
    user: AuthenticatedUser,
    body: web::Json<NewBean>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST bean for {}", user.user_id().short());
    let bean = api.create_bean(user.user_id(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(bean))
}

route!(update_bean => Put "/beans/{id}" impl CatalogManagement);
/// Updates a listing. Listings owned by someone else are reported as not found.
pub async fn update_bean<B: CatalogManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<BeanUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PUT bean #{id} for {}", user.user_id().short());
    let bean = api.update_bean(id, user.user_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bean))
}

route!(delete_bean => Delete "/beans/{id}" impl CatalogManagement);
pub async fn delete_bean<B: CatalogManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE bean #{id} for {}", user.user_id().short());
    api.delete_bean(id, user.user_id()).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(my_beans => Get "/my/beans" impl CatalogManagement);
pub async fn my_beans<B: CatalogManagement>(
    user: AuthenticatedUser,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET my_beans for {}", user.user_id().short());
    let beans = api.beans_for_user(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(beans))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement);
pub async fn my_cart<B: CartManagement>(
    user: AuthenticatedUser,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for {}", user.user_id().short());
    let items = api.cart_items(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(add_cart_item => Post "/cart/items" impl CartManagement);
/// Adds a bean to the caller's cart. Adding a bean that is already in the cart increases its quantity.
pub async fn add_cart_item<B: CartManagement>(
    user: AuthenticatedUser,
    body: web::Json<AddCartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AddCartItemRequest { bean_id, quantity } = body.into_inner();
    debug!("💻️ POST cart item (bean #{bean_id} x {quantity}) for {}", user.user_id().short());
    let item = api.add_item(user.user_id(), bean_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(set_cart_item_quantity => Put "/cart/items/{id}" impl CartManagement);
pub async fn set_cart_item_quantity<B: CartManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<SetQuantityRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    debug!("💻️ PUT cart item #{item_id} = {quantity} for {}", user.user_id().short());
    let item = api.set_quantity(user.user_id(), item_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(remove_cart_item => Delete "/cart/items/{id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ DELETE cart item #{item_id} for {}", user.user_id().short());
    api.remove_item(user.user_id(), item_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl CartManagement, PaymentProcessor);
/// Starts a payment for everything in the caller's cart.
///
/// The cart is NOT emptied here. That only happens once the processor tells us that the payment succeeded, so a
/// customer that abandons the payment keeps their cart.
pub async fn checkout<B: CartManagement, P: PaymentProcessor>(
    user: AuthenticatedUser,
    cart: web::Data<CartApi<B>>,
    processor: web::Data<P>,
    config: web::Data<ProcessorConfig>,
) -> Result<HttpResponse, ServerError> {
    let user_id = user.user_id();
    let amount = cart.checkout_total(user_id).await?;
    debug!("💻️ POST checkout for {} ({amount} {})", user_id.short(), config.currency);
    let intent = processor.create_payment_intent(amount, &config.currency, user_id).await.map_err(|e| {
        warn!("💻️ Could not create a payment intent for {}. {e}", user_id.short());
        e
    })?;
    let response = CheckoutResponse {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount,
        currency: config.currency.clone(),
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl FulfilmentDatabase);
pub async fn my_orders<B: FulfilmentDatabase>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET my_orders for {}", user.user_id().short());
    let orders = api.orders_for_user(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(my_profile => Get "/profile" impl ProfileManagement);
pub async fn my_profile<B: ProfileManagement>(
    user: AuthenticatedUser,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET profile for {}", user.user_id().short());
    let profile = api.profile(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(create_profile => Post "/profile" impl ProfileManagement);
pub async fn create_profile<B: ProfileManagement>(
    user: AuthenticatedUser,
    body: web::Json<NewProfile>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST profile for {}", user.user_id().short());
    let profile = api.create_profile(user.user_id(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

route!(update_profile => Put "/profile" impl ProfileManagement);
pub async fn update_profile<B: ProfileManagement>(
    user: AuthenticatedUser,
    body: web::Json<NewProfile>,
    api: web::Data<ProfileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT profile for {}", user.user_id().short());
    let profile = api.update_profile(user.user_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_webhook => Post "/payments" impl FulfilmentDatabase);
/// Receives payment notifications from the processor.
///
/// This route MUST be wrapped in the signature middleware, which leaves the verified body in the request extensions.
///
/// Any 2xx response tells the processor to stop delivering the notification. Duplicates, empty carts and event types
/// we don't handle are all acknowledged. Database failures return a 500 so that the notification is redelivered;
/// this is safe because materialization is idempotent.
pub async fn payment_webhook<B: FulfilmentDatabase>(
    payload: web::ReqData<VerifiedPayload>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received payment notification");
    let payload = payload.into_inner();
    let ack = api.process_notification(&payload).await.map_err(|e| {
        if e.is_transient() {
            error!("💻️ Payment notification could not be processed and will be retried. {e}");
        } else {
            warn!("💻️ Payment notification rejected. {e}");
        }
        e
    })?;
    info!("💻️ Payment notification handled. {ack}");
    Ok(HttpResponse::Ok().json(JsonResponse::success(ack)))
}
