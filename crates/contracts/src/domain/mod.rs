pub mod a004_product;
