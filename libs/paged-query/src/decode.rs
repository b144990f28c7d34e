//! Row decoding.

use std::marker::PhantomData;

use crate::error::DecodeError;

/// Turns one store row into a domain value.
///
/// The executor drives the row cursor and calls `decode` once per row, so a
/// decoder never holds the cursor and cannot leave it open.
pub trait RowDecoder<R>: Send + Sync {
    type Item: Send;

    fn decode(&self, row: &R) -> Result<Self::Item, DecodeError>;
}

impl<R, T, F> RowDecoder<R> for F
where
    F: Fn(&R) -> Result<T, DecodeError> + Send + Sync,
    T: Send,
{
    type Item = T;

    fn decode(&self, row: &R) -> Result<T, DecodeError> {
        self(row)
    }
}

/// Decodes rows through a type's `sqlx::FromRow` implementation.
pub struct FromRowDecoder<T>(PhantomData<fn() -> T>);

impl<T> FromRowDecoder<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromRowDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FromRowDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for FromRowDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FromRowDecoder<{}>", std::any::type_name::<T>())
    }
}

impl<R, T> RowDecoder<R> for FromRowDecoder<T>
where
    R: sqlx::Row,
    T: for<'r> sqlx::FromRow<'r, R> + Send,
{
    type Item = T;

    fn decode(&self, row: &R) -> Result<T, DecodeError> {
        T::from_row(row).map_err(DecodeError::from)
    }
}
