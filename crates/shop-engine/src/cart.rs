//! Cart aggregation service.

use shop_commerce::cart::{Cart, ResolvedCart, ResolvedLine};
use shop_commerce::catalog::Product;
use shop_commerce::ids::{OwnerKey, ProductId, UserId};
use shop_commerce::CommerceError;
use shop_db::Store;
use std::sync::Arc;
use tracing::debug;

/// Request-level cart operations.
///
/// Mutations persist the cart under its owner key and return the cart
/// with product details resolved into every line. Stock checks here are
/// advisory only: nothing is reserved until checkout, so two concurrent
/// carts may reference more stock than exists.
pub struct CartService<S> {
    store: Arc<S>,
}

impl<S: Store> CartService<S> {
    /// Create a service over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The owner's cart, created empty if absent. Never fails for a
    /// valid store.
    pub fn get(&self, owner: &OwnerKey) -> Result<ResolvedCart, CommerceError> {
        let cart = self.store.fetch_or_create_cart(owner)?;
        self.resolve(cart)
    }

    /// Add a quantity of a product to the owner's cart, merging with an
    /// existing line for the same product.
    pub fn add_item(
        &self,
        owner: &OwnerKey,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<ResolvedCart, CommerceError> {
        let product = self.store.product(product_id)?;
        if !product.can_fulfill(quantity) {
            return Err(CommerceError::InsufficientStock {
                name: product.name,
                requested: quantity,
                available: product.stock,
            });
        }

        let mut cart = self.store.fetch_or_create_cart(owner)?;
        cart.add_line(product_id.clone(), quantity)?;
        self.store.save_cart(&cart)?;

        debug!(owner = %owner, product = %product_id, quantity, "cart item added");
        self.resolve(cart)
    }

    /// Set the quantity of an existing line. Does not add.
    pub fn update_item(
        &self,
        owner: &OwnerKey,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<ResolvedCart, CommerceError> {
        let mut cart = self
            .store
            .cart(owner)?
            .ok_or_else(|| CommerceError::CartNotFound(owner.to_string()))?;

        if cart.line(product_id).is_none() {
            return Err(CommerceError::ItemNotInCart(product_id.to_string()));
        }

        let product = self.store.product(product_id)?;
        if !product.can_fulfill(quantity) {
            return Err(CommerceError::InsufficientStock {
                name: product.name,
                requested: quantity,
                available: product.stock,
            });
        }

        cart.set_quantity(product_id, quantity)?;
        self.store.save_cart(&cart)?;

        debug!(owner = %owner, product = %product_id, quantity, "cart item updated");
        self.resolve(cart)
    }

    /// Remove the line for a product. Idempotent: removing an absent
    /// line just returns the current cart.
    pub fn remove_item(
        &self,
        owner: &OwnerKey,
        product_id: &ProductId,
    ) -> Result<ResolvedCart, CommerceError> {
        let mut cart = self.store.fetch_or_create_cart(owner)?;
        if cart.remove_line(product_id) {
            self.store.save_cart(&cart)?;
            debug!(owner = %owner, product = %product_id, "cart item removed");
        }
        self.resolve(cart)
    }

    /// Empty the owner's cart. The record survives.
    pub fn clear(&self, owner: &OwnerKey) -> Result<ResolvedCart, CommerceError> {
        let mut cart = self.store.fetch_or_create_cart(owner)?;
        cart.clear();
        self.store.save_cart(&cart)?;

        debug!(owner = %owner, "cart cleared");
        self.resolve(cart)
    }

    /// Fold a guest cart into a user's cart after login, merging
    /// duplicate products by summing quantities. The guest record is
    /// deleted.
    pub fn merge_guest_cart(
        &self,
        guest_token: &str,
        user: &UserId,
    ) -> Result<ResolvedCart, CommerceError> {
        let guest_key = OwnerKey::guest(guest_token);
        let user_key = OwnerKey::user(user.clone());

        let Some(guest_cart) = self.store.cart(&guest_key)? else {
            return self.get(&user_key);
        };

        let mut user_cart = self.store.fetch_or_create_cart(&user_key)?;
        user_cart.absorb(guest_cart);
        self.store.save_cart(&user_cart)?;
        self.store.delete_cart(&guest_key)?;

        debug!(guest = guest_token, user = %user, "guest cart merged");
        self.resolve(user_cart)
    }

    /// Join product details into each line. Lines whose product has
    /// vanished from the catalog are dropped from the view.
    fn resolve(&self, cart: Cart) -> Result<ResolvedCart, CommerceError> {
        let mut items = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            match self.store.product(&line.product_id) {
                Ok(product) => items.push(joined(product, line.quantity)),
                Err(CommerceError::ProductNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(ResolvedCart::new(cart.owner, items))
    }
}

fn joined(product: Product, quantity: i64) -> ResolvedLine {
    ResolvedLine {
        line_total: product.price * quantity,
        product,
        quantity,
    }
}
