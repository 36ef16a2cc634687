// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Balcão ---
        handlers::sale::search_catalog,
        handlers::sale::cart_totals,
        handlers::sale::installments_preview,
        handlers::sale::checkout,

        // --- Orçamentos ---
        handlers::quote::list_quotes,
        handlers::quote::get_quote,
        handlers::quote::update_status,
        handlers::quote::reopen_quote,
        handlers::quote::attach_freight,
        handlers::quote::mark_pdf_generated,
        handlers::quote::mark_delivered,
        handlers::quote::delete_quote,

        // --- Descontos ---
        handlers::discount::request_discount,
        handlers::discount::get_discount_request,
        handlers::discount::decide_discount_request,

        // --- Frete ---
        handlers::freight::rate_shop,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::catalog::Product,
            models::catalog::ProductSearchHit,

            // --- Venda ---
            models::sale::ItemKind,
            models::sale::CartItem,
            models::sale::CartTotals,
            models::sale::PaymentMethod,
            models::sale::InstallmentPlan,
            services::cart::GateState,

            // --- Orçamentos ---
            models::quote::QuoteStatus,
            models::quote::Quote,
            models::quote::QuoteItem,
            models::quote::QuoteDetail,
            models::quote::FreightAttachment,
            models::quote::TicketStatus,
            models::quote::DiscountTicket,

            // --- Payloads ---
            handlers::sale::CartTotalsPayload,
            handlers::sale::CartTotalsResponse,
            handlers::sale::InstallmentsPayload,
            handlers::sale::CheckoutPayload,
            handlers::quote::UpdateStatusPayload,
            handlers::quote::AttachFreightPayload,
            handlers::discount::RequestDiscountPayload,
            handlers::discount::DecideDiscountPayload,
            handlers::freight::RateShopPayload,
        )
    ),
    tags(
        (name = "Sales", description = "Balcão: busca, totais, parcelamento e checkout"),
        (name = "Quotes", description = "Ciclo de vida dos orçamentos"),
        (name = "Discounts", description = "Autorização de desconto acima da alçada"),
        (name = "Freight", description = "Cotação de frete")
    )
)]
pub struct ApiDoc;
