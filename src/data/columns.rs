//! Column names of the transactions table.

pub const TRANSACTION_ID: &str = "transaction_id";
pub const ORDER_DATE: &str = "order_date";
pub const PRODUCT_NAME: &str = "product_name";
pub const CATEGORY: &str = "category";
pub const QUANTITY: &str = "quantity";
pub const UNIT_PRICE: &str = "unit_price";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const COUNTRY: &str = "country";
pub const CUSTOMER_ID: &str = "customer_id";
pub const CUSTOMER_SEGMENT: &str = "customer_segment";

/// Columns the pipeline reads from the transactions table.
pub const REQUIRED: [&str; 10] = [
    TRANSACTION_ID,
    ORDER_DATE,
    PRODUCT_NAME,
    CATEGORY,
    QUANTITY,
    UNIT_PRICE,
    TOTAL_AMOUNT,
    COUNTRY,
    CUSTOMER_ID,
    CUSTOMER_SEGMENT,
];

/// Columns shown in the detailed data table (customer_id is left out).
pub const PREVIEW: [&str; 9] = [
    TRANSACTION_ID,
    ORDER_DATE,
    PRODUCT_NAME,
    CATEGORY,
    QUANTITY,
    UNIT_PRICE,
    TOTAL_AMOUNT,
    COUNTRY,
    CUSTOMER_SEGMENT,
];
