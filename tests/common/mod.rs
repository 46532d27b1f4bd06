#![allow(dead_code)]

use rust_decimal::Decimal;
use seller_settlement::{
    models::{
        order::{NewLineItem, PaymentMode, PaymentStatus, PlaceOrderRequest, ShippingAddress},
        seller::{BankDetails, UpsertSellerRequest},
    },
    services::admin_service,
    store::MemoryStore,
};

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha".into(),
        phone: "9999999999".into(),
        line1: "12 MG Road".into(),
        line2: None,
        city: "Pune".into(),
        state: "MH".into(),
        postal_code: "411001".into(),
        country: "IN".into(),
    }
}

pub fn item(seller_id: &str, quantity: u32, unit_price: i64) -> NewLineItem {
    NewLineItem {
        product_id: format!("p-{seller_id}-{unit_price}"),
        seller_id: seller_id.into(),
        title: None,
        quantity,
        unit_price: Decimal::from(unit_price),
    }
}

pub fn order_request(
    items: Vec<NewLineItem>,
    payment_mode: PaymentMode,
    payment_status: PaymentStatus,
) -> PlaceOrderRequest {
    PlaceOrderRequest {
        buyer_id: None,
        items,
        shipping_address: address(),
        payment_mode,
        payment_status: Some(payment_status),
    }
}

pub fn bank_details() -> BankDetails {
    BankDetails {
        account_holder_name: "Asha Rao".into(),
        account_number: "000123456789".into(),
        ifsc_code: "HDFC0000123".into(),
        bank_name: "HDFC Bank".into(),
        upi_id: None,
    }
}

/// Creates a seller profile with bank details and the given commission percent.
pub async fn seed_seller(store: &MemoryStore, seller_id: &str, commission: i64) {
    admin_service::upsert_seller(
        store,
        seller_id,
        UpsertSellerRequest {
            display_name: format!("Seller {seller_id}"),
            email: Some(format!("{seller_id}@example.com")),
            phone: None,
            store_name: None,
            commission: Some(Decimal::from(commission)),
            bank_details: Some(bank_details()),
        },
    )
    .await
    .unwrap();
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}
