use super::repo_types::{Category, NewProduct, ProductChanges};
use crate::{error::AppError, upload::MultipartForm};

pub const IMAGE_FIELD: &str = "image";

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 1000;
const BRAND_MAX: usize = 50;

fn check_len(value: &str, max: usize, label: &str) -> Result<String, AppError> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} cannot exceed {} characters",
            label, max
        )));
    }
    Ok(value.to_string())
}

fn parse_price(raw: &str) -> Result<f64, AppError> {
    let price = raw
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| AppError::validation("Price must be a number"))?;
    if price < 0.0 {
        return Err(AppError::validation("Price cannot be negative"));
    }
    Ok(price)
}

fn parse_stock(raw: &str) -> Result<i32, AppError> {
    let stock: i32 = raw
        .parse()
        .map_err(|_| AppError::validation("Stock must be a whole number"))?;
    if stock < 0 {
        return Err(AppError::validation("Stock cannot be negative"));
    }
    Ok(stock)
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse::<Category>().map_err(AppError::Validation)
}

/// Field checks for `POST /api/products`.
pub fn new_product(form: &MultipartForm) -> Result<NewProduct, AppError> {
    let (Some(name), Some(description), Some(price), Some(category)) = (
        form.text("name"),
        form.text("description"),
        form.text("price"),
        form.text("category"),
    ) else {
        return Err(AppError::validation(
            "Name, description, price, and category are required",
        ));
    };

    Ok(NewProduct {
        name: check_len(name, NAME_MAX, "Product name")?,
        description: check_len(description, DESCRIPTION_MAX, "Description")?,
        price: parse_price(price)?,
        category: parse_category(category)?,
        brand: form
            .text("brand")
            .map(|b| check_len(b, BRAND_MAX, "Brand name"))
            .transpose()?,
        stock: form.text("stock").map(parse_stock).transpose()?.unwrap_or(0),
    })
}

/// Field checks for `PUT /api/products/:id`. Blank fields are ignored except
/// `brand`, where a blank value clears it.
pub fn product_changes(form: &MultipartForm) -> Result<ProductChanges, AppError> {
    let brand = if form.has("brand") {
        Some(
            form.text("brand")
                .map(|b| check_len(b, BRAND_MAX, "Brand name"))
                .transpose()?,
        )
    } else {
        None
    };

    Ok(ProductChanges {
        name: form
            .text("name")
            .map(|n| check_len(n, NAME_MAX, "Product name"))
            .transpose()?,
        description: form
            .text("description")
            .map(|d| check_len(d, DESCRIPTION_MAX, "Description"))
            .transpose()?,
        price: form.text("price").map(parse_price).transpose()?,
        category: form.text("category").map(parse_category).transpose()?,
        brand,
        stock: form.text("stock").map(parse_stock).transpose()?,
    })
}
