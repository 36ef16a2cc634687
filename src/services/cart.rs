// src/services/cart.rs
//
// Carrinho da venda rápida: conjunto de trabalho em memória, exclusivo da
// sessão do vendedor. Nenhuma operação aqui toca estoque ou banco; a reserva
// acontece uma única vez, na finalização (services/stock.rs).

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        money::{apply_percent, clamp_non_negative},
    },
    models::{
        catalog::Product,
        sale::{CartItem, CartTotals, ItemKind},
    },
};

fn validation_error(field: &'static str, code: &'static str, message: &'static str) -> AppError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field.into(), err);
    AppError::ValidationError(errors)
}

/// Valida uma linha vinda de fora (payload de checkout ou prévia de totais).
pub fn validate_item(item: &CartItem) -> Result<(), AppError> {
    if item.name.trim().is_empty() {
        return Err(validation_error(
            "name",
            "required",
            "O nome do item é obrigatório.",
        ));
    }
    if item.quantity < 1 {
        return Err(validation_error(
            "quantity",
            "range",
            "A quantidade deve ser no mínimo 1.",
        ));
    }
    if item.unit_price < Decimal::ZERO {
        return Err(validation_error(
            "unitPrice",
            "range",
            "O preço unitário não pode ser negativo.",
        ));
    }
    if item.line_discount_percent < Decimal::ZERO
        || item.line_discount_percent > Decimal::ONE_HUNDRED
    {
        return Err(validation_error(
            "lineDiscountPercent",
            "range",
            "O desconto do item deve estar entre 0 e 100.",
        ));
    }
    if item.kind == ItemKind::Catalog && item.product_id.is_none() {
        return Err(validation_error(
            "productId",
            "required",
            "Item de catálogo exige o id do produto.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monta um carrinho a partir de linhas externas, validando cada uma.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, AppError> {
        for item in &items {
            validate_item(item)?;
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adiciona uma peça do catálogo. Se a peça já está no carrinho,
    /// incrementa a quantidade em vez de duplicar a linha.
    pub fn add_catalog_item(&mut self, product: &Product) {
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|l| l.product_id == Some(product.id))
        {
            line.quantity += 1;
            return;
        }
        self.items.push(CartItem {
            kind: ItemKind::Catalog,
            product_id: Some(product.id),
            name: product.name.clone(),
            quantity: 1,
            unit_price: product.unit_price,
            line_discount_percent: Decimal::ZERO,
        });
    }

    /// Adiciona um item avulso (peça sem cadastro, digitada no balcão).
    pub fn add_ad_hoc_item(&mut self, name: &str, unit_price: Decimal) -> Result<(), AppError> {
        if name.trim().is_empty() {
            return Err(validation_error(
                "name",
                "required",
                "O nome do item é obrigatório.",
            ));
        }
        if unit_price <= Decimal::ZERO {
            return Err(validation_error(
                "unitPrice",
                "range",
                "O preço do item avulso deve ser maior que zero.",
            ));
        }
        self.items.push(CartItem {
            kind: ItemKind::AdHoc,
            product_id: None,
            name: name.trim().to_string(),
            quantity: 1,
            unit_price,
            line_discount_percent: Decimal::ZERO,
        });
        Ok(())
    }

    /// Quantidade zero (ou negativa) remove a linha: o contrato do carrinho
    /// é que nenhuma linha persiste com quantidade 0.
    pub fn set_quantity(&mut self, index: usize, quantity: i32) -> Result<(), AppError> {
        if index >= self.items.len() {
            return Err(validation_error(
                "lineIndex",
                "range",
                "Linha inexistente no carrinho.",
            ));
        }
        if quantity <= 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
        }
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<(), AppError> {
        if index >= self.items.len() {
            return Err(validation_error(
                "lineIndex",
                "range",
                "Linha inexistente no carrinho.",
            ));
        }
        self.items.remove(index);
        Ok(())
    }

    pub fn totals(&self, general_discount_percent: Decimal, freight: Decimal) -> CartTotals {
        compute_totals(&self.items, general_discount_percent, freight)
    }
}

/// Agregador de preços: função pura de (linhas, desconto geral, frete).
///
/// total = subtotal − descontos por item − desconto geral sobre o subtotal
///         + frete, com piso em zero.
///
/// Recalculado a cada mutação; o agregado é barato e nunca pode ficar
/// defasado. Arredondamento só na apresentação (`CartTotals::presented`).
pub fn compute_totals(
    items: &[CartItem],
    general_discount_percent: Decimal,
    freight: Decimal,
) -> CartTotals {
    let mut subtotal = Decimal::ZERO;
    let mut line_discount_total = Decimal::ZERO;

    for item in items {
        let gross = item.unit_price * Decimal::from(item.quantity);
        subtotal += gross;
        line_discount_total += apply_percent(gross, item.line_discount_percent);
    }

    let general_discount_value = apply_percent(subtotal, general_discount_percent);
    let total =
        clamp_non_negative(subtotal - line_discount_total - general_discount_value + freight);

    CartTotals {
        subtotal,
        line_discount_total,
        general_discount_percent,
        general_discount_value,
        freight,
        total,
    }
}

// --- Alçada de desconto ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    WithinPolicy,
    PendingManagerApproval,
    Approved,
    Rejected,
}

/// Trava de alçada de desconto do lado do cliente.
///
/// É uma salvaguarda de UX, não uma fronteira de segurança: a mesma regra é
/// reavaliada pelo servidor na finalização (QuoteService::checkout), que só
/// aceita desconto acima da alçada acompanhado de um ticket aprovado.
#[derive(Debug, Clone)]
pub struct DiscountGate {
    threshold_percent: Decimal,
    requested_percent: Decimal,
    state: GateState,
}

impl DiscountGate {
    pub fn new(threshold_percent: Decimal) -> Self {
        Self {
            threshold_percent,
            requested_percent: Decimal::ZERO,
            state: GateState::WithinPolicy,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn requested_percent(&self) -> Decimal {
        self.requested_percent
    }

    /// Reavalia a trava sempre que o desconto geral muda. Uma aprovação ou
    /// rejeição anterior vale para o percentual da época, então mudar o
    /// desconto descarta a decisão.
    pub fn set_discount(&mut self, percent: Decimal) {
        self.requested_percent = percent;
        self.state = if percent <= self.threshold_percent {
            GateState::WithinPolicy
        } else {
            GateState::PendingManagerApproval
        };
    }

    /// Sinal de aprovação do gestor (chega pela consulta do ticket).
    pub fn mark_approved(&mut self) {
        if self.state == GateState::PendingManagerApproval {
            self.state = GateState::Approved;
        }
    }

    pub fn mark_rejected(&mut self) {
        if self.state == GateState::PendingManagerApproval {
            self.state = GateState::Rejected;
        }
    }

    /// Segundo remédio oferecido ao vendedor: reduzir o desconto até a
    /// alçada e seguir sem autorização.
    pub fn clamp_to_threshold(&mut self) {
        self.set_discount(self.threshold_percent);
    }

    pub fn checkout_allowed(&self) -> bool {
        matches!(self.state, GateState::WithinPolicy | GateState::Approved)
    }

    pub fn ensure_checkout_allowed(&self) -> Result<(), AppError> {
        if self.checkout_allowed() {
            Ok(())
        } else {
            Err(AppError::DiscountAboveThreshold {
                requested: self.requested_percent,
                threshold: self.threshold_percent,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    fn product(name: &str, price: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: format!("SKU-{name}"),
            name: name.to_string(),
            brand: None,
            category: None,
            unit_price: price,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn add_catalog_item_merges_by_product() {
        let mut cart = Cart::new();
        let filtro = product("Filtro de óleo", dec(8990, 2));

        cart.add_catalog_item(&filtro);
        cart.add_catalog_item(&filtro);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn ad_hoc_item_rejects_empty_name_and_non_positive_price() {
        let mut cart = Cart::new();
        assert!(cart.add_ad_hoc_item("  ", dec(100, 2)).is_err());
        assert!(cart.add_ad_hoc_item("Mangueira", Decimal::ZERO).is_err());
        assert!(cart.add_ad_hoc_item("Mangueira", dec(-1, 2)).is_err());
        assert!(cart.add_ad_hoc_item("Mangueira", dec(1550, 2)).is_ok());
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let mut cart = Cart::new();
        cart.add_catalog_item(&product("Vela", dec(2500, 2)));
        cart.set_quantity(0, 5).unwrap();
        assert_eq!(cart.items()[0].quantity, 5);

        cart.set_quantity(0, 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.set_quantity(0, 1).is_err());
    }

    #[test]
    fn totals_match_the_pricing_formula() {
        // 2x 100.00 + 1 item avulso de 50.00, frete 10.00, sem desconto geral.
        let mut cart = Cart::new();
        let pastilha = product("Pastilha de freio", dec(10000, 2));
        cart.add_catalog_item(&pastilha);
        cart.add_catalog_item(&pastilha);
        cart.add_ad_hoc_item("Abraçadeira reforçada", dec(5000, 2))
            .unwrap();

        let totals = cart.totals(Decimal::ZERO, dec(1000, 2)).presented();
        assert_eq!(totals.subtotal, dec(25000, 2));
        assert_eq!(totals.line_discount_total, Decimal::ZERO.round_dp(2));
        assert_eq!(totals.total, dec(26000, 2));
    }

    #[test]
    fn general_discount_applies_over_the_subtotal() {
        let mut cart = Cart::new();
        cart.add_ad_hoc_item("Jogo de juntas", dec(20000, 2)).unwrap();

        let totals = cart.totals(dec(15, 0), Decimal::ZERO).presented();
        assert_eq!(totals.general_discount_value, dec(3000, 2));
        assert_eq!(totals.total, dec(17000, 2));
    }

    #[test]
    fn line_discount_enters_the_aggregate() {
        let mut cart = Cart::new();
        cart.add_ad_hoc_item("Amortecedor", dec(40000, 2)).unwrap();
        cart.items.get_mut(0).unwrap().line_discount_percent = dec(10, 0);

        let totals = cart.totals(Decimal::ZERO, Decimal::ZERO).presented();
        assert_eq!(totals.line_discount_total, dec(4000, 2));
        assert_eq!(totals.total, dec(36000, 2));
    }

    #[test]
    fn add_then_remove_restores_previous_totals() {
        let mut cart = Cart::new();
        cart.add_ad_hoc_item("Correia dentada", dec(12000, 2)).unwrap();
        let before = cart.totals(dec(5, 0), dec(2000, 2));

        cart.add_catalog_item(&product("Tensor", dec(8000, 2)));
        cart.remove_line(1).unwrap();

        assert_eq!(cart.totals(dec(5, 0), dec(2000, 2)), before);
    }

    #[test]
    fn total_is_clamped_at_zero() {
        let mut cart = Cart::new();
        cart.add_ad_hoc_item("Parafuso", dec(1000, 2)).unwrap();

        // Desconto geral de 100% + desconto de linha: sem frete o total
        // ficaria negativo, mas o agregador trava no piso zero.
        cart.items.get_mut(0).unwrap().line_discount_percent = dec(50, 0);
        let totals = cart.totals(Decimal::ONE_HUNDRED, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn empty_cart_totals_are_all_zero_plus_freight() {
        let totals = compute_totals(&[], dec(10, 0), dec(1500, 2));
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, dec(1500, 2));
    }

    #[test]
    fn gate_is_monotonic_around_the_threshold() {
        let mut gate = DiscountGate::new(dec(10, 0));

        for p in [0, 3, 7, 10] {
            gate.set_discount(dec(p, 0));
            assert_eq!(gate.state(), GateState::WithinPolicy, "{p}%");
            assert!(gate.ensure_checkout_allowed().is_ok());
        }
        // 10.01% já passa da alçada.
        gate.set_discount(dec(1001, 2));
        assert_eq!(gate.state(), GateState::PendingManagerApproval);

        for p in [11, 15, 50, 100] {
            gate.set_discount(dec(p, 0));
            assert_eq!(gate.state(), GateState::PendingManagerApproval, "{p}%");
            assert!(matches!(
                gate.ensure_checkout_allowed(),
                Err(AppError::DiscountAboveThreshold { .. })
            ));
        }
    }

    #[test]
    fn approval_unblocks_and_discount_change_discards_it() {
        let mut gate = DiscountGate::new(dec(10, 0));
        gate.set_discount(dec(15, 0));
        gate.mark_approved();
        assert_eq!(gate.state(), GateState::Approved);
        assert!(gate.checkout_allowed());

        // Mudou o desconto: a aprovação anterior não vale mais.
        gate.set_discount(dec(20, 0));
        assert_eq!(gate.state(), GateState::PendingManagerApproval);
    }

    #[test]
    fn clamp_remedy_returns_to_policy() {
        let mut gate = DiscountGate::new(dec(10, 0));
        gate.set_discount(dec(25, 0));
        gate.clamp_to_threshold();
        assert_eq!(gate.state(), GateState::WithinPolicy);
        assert_eq!(gate.requested_percent(), dec(10, 0));
    }

    #[test]
    fn rejection_keeps_checkout_blocked() {
        let mut gate = DiscountGate::new(dec(10, 0));
        gate.set_discount(dec(12, 0));
        gate.mark_rejected();
        assert_eq!(gate.state(), GateState::Rejected);
        assert!(gate.ensure_checkout_allowed().is_err());
    }
}
