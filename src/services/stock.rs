// src/services/stock.rs
//
// Contrato com o colaborador de estoque e o protocolo de reserva do
// checkout. O motor não é dono do armazenamento de inventário: ele exige um
// `StockGateway` cuja reserva é atômica por produto (a implementação
// Postgres usa UPDATE condicional; duas vendas concorrentes da mesma peça
// são resolvidas lá, não aqui).

use async_trait::async_trait;
use uuid::Uuid;

use crate::{common::error::AppError, models::sale::CartItem};

#[async_trait]
pub trait StockGateway: Send + Sync {
    /// Decrementa o saldo disponível. Falha com `InsufficientStock` quando a
    /// quantidade pedida excede o disponível. Atômica por produto.
    async fn reserve(&self, product_id: Uuid, quantity: i32) -> Result<(), AppError>;

    /// Ação compensatória: devolve quantidade ao saldo disponível.
    async fn release(&self, product_id: Uuid, quantity: i32) -> Result<(), AppError>;
}

/// Livro-razão das reservas de uma tentativa de checkout.
///
/// Toda liberação passa por aqui e é limitada ao que ESTA transação
/// reservou: compensação nunca cria estoque do nada por liberação em
/// duplicidade.
#[derive(Debug, Default)]
pub struct ReservationLedger {
    // (produto, quantidade ainda reservada), na ordem de reserva.
    entries: Vec<(Uuid, i32)>,
}

impl ReservationLedger {
    pub fn outstanding(&self, product_id: Uuid) -> i32 {
        self.entries
            .iter()
            .filter(|(id, _)| *id == product_id)
            .map(|(_, qty)| qty)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, qty)| *qty == 0)
    }

    fn record(&mut self, product_id: Uuid, quantity: i32) {
        self.entries.push((product_id, quantity));
    }

    /// Libera uma quantidade parcial, rejeitando o que exceder o saldo
    /// reservado desta transação.
    pub async fn release(
        &mut self,
        gateway: &dyn StockGateway,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError> {
        let outstanding = self.outstanding(product_id);
        if quantity > outstanding {
            return Err(AppError::ReleaseExceedsReservation {
                product_id,
                requested: quantity,
                outstanding,
            });
        }

        gateway.release(product_id, quantity).await?;

        // Abate do livro-razão, das entradas mais antigas para as novas.
        let mut remaining = quantity;
        for (id, qty) in self.entries.iter_mut() {
            if *id != product_id || remaining == 0 {
                continue;
            }
            let take = remaining.min(*qty);
            *qty -= take;
            remaining -= take;
        }
        Ok(())
    }

    /// Desfaz tudo que ainda está reservado. Usada no rollback do checkout e
    /// na compensação de cancelamento. Falhas de liberação são logadas e não
    /// interrompem as demais (melhor liberar o possível do que nada).
    pub async fn release_all(&mut self, gateway: &dyn StockGateway) {
        for (product_id, qty) in std::mem::take(&mut self.entries) {
            if qty == 0 {
                continue;
            }
            if let Err(err) = gateway.release(product_id, qty).await {
                tracing::error!(
                    "Falha ao liberar reserva de {} unidades do produto {}: {}",
                    qty,
                    product_id,
                    err
                );
            }
        }
    }
}

/// Soma as quantidades por produto, preservando a ordem da primeira
/// ocorrência. Itens avulsos não têm estoque e ficam de fora.
fn aggregate_quantities(items: &[CartItem]) -> Vec<(Uuid, i32)> {
    let mut aggregated: Vec<(Uuid, i32)> = Vec::new();
    for item in items {
        let Some(product_id) = item.product_id else {
            continue;
        };
        match aggregated.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, qty)) => *qty += item.quantity,
            None => aggregated.push((product_id, item.quantity)),
        }
    }
    aggregated
}

/// Protocolo de reserva do checkout: uma chamada de `reserve` por produto
/// distinto, com a quantidade somada do carrinho. Tudo-ou-nada: se qualquer
/// reserva falhar, as anteriores da MESMA tentativa são desfeitas antes de
/// propagar o erro — o efeito líquido de um checkout que falhou é zero.
pub async fn reserve_cart(
    gateway: &dyn StockGateway,
    items: &[CartItem],
) -> Result<ReservationLedger, AppError> {
    let mut ledger = ReservationLedger::default();

    for (product_id, quantity) in aggregate_quantities(items) {
        match gateway.reserve(product_id, quantity).await {
            Ok(()) => ledger.record(product_id, quantity),
            Err(err) => {
                ledger.release_all(gateway).await;
                return Err(err);
            }
        }
    }

    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sale::ItemKind;
    use rust_decimal::Decimal;
    use std::{collections::HashMap, sync::Mutex};

    /// Colaborador de estoque em memória, com a mesma semântica do gateway
    /// Postgres: decremento condicional atômico.
    struct InMemoryStock {
        levels: Mutex<HashMap<Uuid, i32>>,
    }

    impl InMemoryStock {
        fn with_levels(levels: &[(Uuid, i32)]) -> Self {
            Self {
                levels: Mutex::new(levels.iter().copied().collect()),
            }
        }

        fn available(&self, product_id: Uuid) -> i32 {
            *self.levels.lock().unwrap().get(&product_id).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl StockGateway for InMemoryStock {
        async fn reserve(&self, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
            let mut levels = self.levels.lock().unwrap();
            let available = levels.get(&product_id).copied().unwrap_or(0);
            if quantity > available {
                return Err(AppError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available,
                });
            }
            levels.insert(product_id, available - quantity);
            Ok(())
        }

        async fn release(&self, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
            let mut levels = self.levels.lock().unwrap();
            *levels.entry(product_id).or_insert(0) += quantity;
            Ok(())
        }
    }

    fn catalog_item(product_id: Uuid, quantity: i32) -> CartItem {
        CartItem {
            kind: ItemKind::Catalog,
            product_id: Some(product_id),
            name: "Peça".to_string(),
            quantity,
            unit_price: Decimal::new(1000, 2),
            line_discount_percent: Decimal::ZERO,
        }
    }

    fn ad_hoc_item(quantity: i32) -> CartItem {
        CartItem {
            kind: ItemKind::AdHoc,
            product_id: None,
            name: "Avulso".to_string(),
            quantity,
            unit_price: Decimal::new(500, 2),
            line_discount_percent: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn failed_reservation_rolls_back_everything() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // B só tem 1 unidade: a segunda reserva falha.
        let stock = InMemoryStock::with_levels(&[(a, 10), (b, 1)]);

        let items = vec![catalog_item(a, 3), catalog_item(b, 2)];
        let result = reserve_cart(&stock, &items).await;

        assert!(matches!(
            result,
            Err(AppError::InsufficientStock { product_id, requested: 2, available: 1 })
                if product_id == b
        ));
        // Efeito líquido zero para os dois produtos.
        assert_eq!(stock.available(a), 10);
        assert_eq!(stock.available(b), 1);
    }

    #[tokio::test]
    async fn duplicate_lines_are_summed_per_product() {
        let a = Uuid::new_v4();
        let stock = InMemoryStock::with_levels(&[(a, 5)]);

        // Mesma peça em duas linhas (3 + 3 = 6 > 5): uma única chamada de
        // reserva com a soma, que falha sem deixar resíduo.
        let items = vec![catalog_item(a, 3), catalog_item(a, 3)];
        assert!(reserve_cart(&stock, &items).await.is_err());
        assert_eq!(stock.available(a), 5);

        let items = vec![catalog_item(a, 3), catalog_item(a, 2)];
        let ledger = reserve_cart(&stock, &items).await.unwrap();
        assert_eq!(stock.available(a), 0);
        assert_eq!(ledger.outstanding(a), 5);
    }

    #[tokio::test]
    async fn ad_hoc_items_do_not_touch_stock() {
        let stock = InMemoryStock::with_levels(&[]);
        let ledger = reserve_cart(&stock, &[ad_hoc_item(4)]).await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn release_is_bounded_by_the_ledger() {
        let a = Uuid::new_v4();
        let stock = InMemoryStock::with_levels(&[(a, 10)]);

        let mut ledger = reserve_cart(&stock, &[catalog_item(a, 4)]).await.unwrap();

        // Liberar além do reservado por esta transação é rejeitado.
        let err = ledger.release(&stock, a, 5).await;
        assert!(matches!(
            err,
            Err(AppError::ReleaseExceedsReservation { requested: 5, outstanding: 4, .. })
        ));
        assert_eq!(stock.available(a), 6);

        // Liberação parcial dentro do limite funciona e abate o saldo.
        ledger.release(&stock, a, 3).await.unwrap();
        assert_eq!(stock.available(a), 9);
        assert_eq!(ledger.outstanding(a), 1);

        ledger.release(&stock, a, 1).await.unwrap();
        assert!(ledger.is_empty());
        assert_eq!(stock.available(a), 10);
    }

    #[tokio::test]
    async fn release_all_compensates_outstanding_reservations() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stock = InMemoryStock::with_levels(&[(a, 3), (b, 2)]);

        let mut ledger = reserve_cart(&stock, &[catalog_item(a, 3), catalog_item(b, 2)])
            .await
            .unwrap();
        assert_eq!(stock.available(a), 0);

        ledger.release_all(&stock).await;
        assert_eq!(stock.available(a), 3);
        assert_eq!(stock.available(b), 2);
        assert!(ledger.is_empty());
    }
}
