use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Buyer, BuyerUpdate, NewBuyer, NewSupplier, Supplier, SupplierUpdate},
    helpers::FieldCheck,
    traits::{Caller, DirectoryError, DirectoryManagement, Page, Pagination},
};

fn check_buyer_fields(
    check: &mut FieldCheck,
    name: Option<&String>,
    person: Option<&String>,
    phone: Option<&String>,
    address: [(&str, Option<&String>, usize); 8],
) {
    check.max_length_opt("name", name, 70).max_length_opt("person", person, 70).max_length_opt("phone", phone, 20);
    for (field, value, max) in address {
        check.max_length_opt(field, value, max);
    }
}

fn check_new_buyer(buyer: &NewBuyer) -> Result<(), DirectoryError> {
    let mut check = FieldCheck::new();
    check.required("name", &buyer.name).required("person", &buyer.person).required("phone", &buyer.phone).required(
        "locality_name",
        &buyer.locality_name,
    );
    check_buyer_fields(&mut check, Some(&buyer.name), Some(&buyer.person), Some(&buyer.phone), [
        ("region", Some(&buyer.region), 30),
        ("district", Some(&buyer.district), 30),
        ("locality_name", Some(&buyer.locality_name), 50),
        ("street", Some(&buyer.street), 80),
        ("house", Some(&buyer.house), 15),
        ("structure", Some(&buyer.structure), 15),
        ("building", Some(&buyer.building), 15),
        ("apartment", Some(&buyer.apartment), 15),
    ]);
    check.finish().map_err(DirectoryError::ValidationError)
}

fn check_buyer_update(update: &BuyerUpdate) -> Result<(), DirectoryError> {
    let mut check = FieldCheck::new();
    for (field, value) in [
        ("name", &update.name),
        ("person", &update.person),
        ("phone", &update.phone),
        ("locality_name", &update.locality_name),
    ] {
        if let Some(v) = value {
            check.required(field, v);
        }
    }
    check_buyer_fields(&mut check, update.name.as_ref(), update.person.as_ref(), update.phone.as_ref(), [
        ("region", update.region.as_ref(), 30),
        ("district", update.district.as_ref(), 30),
        ("locality_name", update.locality_name.as_ref(), 50),
        ("street", update.street.as_ref(), 80),
        ("house", update.house.as_ref(), 15),
        ("structure", update.structure.as_ref(), 15),
        ("building", update.building.as_ref(), 15),
        ("apartment", update.apartment.as_ref(), 15),
    ]);
    check.finish().map_err(DirectoryError::ValidationError)
}

fn check_supplier_fields(
    name: Option<&String>,
    person: Option<&String>,
    phone: Option<&String>,
    file_url: Option<&String>,
    required: bool,
) -> Result<(), DirectoryError> {
    let mut check = FieldCheck::new();
    for (field, value) in [("name", name), ("person", person), ("phone", phone)] {
        match value {
            Some(v) => {
                check.required(field, v);
            },
            None if required => {
                check.push(format!("{field}: This field is required."));
            },
            None => {},
        }
    }
    check
        .max_length_opt("name", name, 70)
        .max_length_opt("person", person, 70)
        .max_length_opt("phone", phone, 20)
        .max_length_opt("file_url", file_url, 200);
    check.finish().map_err(DirectoryError::ValidationError)
}

/// Manages the buyer and supplier organisations that users act for.
///
/// Regular users only see and modify their own buyers, and only modify their own suppliers. Administrators can
/// manage any record. Touching a record that belongs to someone else is forbidden.
pub struct DirectoryApi<B> {
    db: B,
}

impl<B: Debug> Debug for DirectoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DirectoryApi ({:?})", self.db)
    }
}

impl<B> DirectoryApi<B>
where B: DirectoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    fn owner(caller: &Caller) -> Option<i64> {
        (!caller.is_admin).then_some(caller.user_id)
    }

    //------------------------------------------   Buyers    ---------------------------------------------------------
    pub async fn buyers(&self, caller: &Caller, page: Pagination) -> Result<Page<Buyer>, DirectoryError> {
        self.db.fetch_buyers(Self::owner(caller), page).await
    }

    pub async fn buyer(&self, caller: &Caller, buyer_id: i64) -> Result<Buyer, DirectoryError> {
        let buyer = self.db.fetch_buyer(buyer_id, None).await?.ok_or(DirectoryError::BuyerNotFound(buyer_id))?;
        if !caller.is_admin && buyer.user_id != caller.user_id {
            return Err(DirectoryError::Forbidden(format!("buyer #{buyer_id}")));
        }
        Ok(buyer)
    }

    async fn ensure_supplier_access(&self, caller: &Caller, supplier_id: i64) -> Result<(), DirectoryError> {
        let supplier = self.supplier(supplier_id).await?;
        if !caller.is_admin && supplier.user_id != caller.user_id {
            return Err(DirectoryError::Forbidden(format!("supplier #{supplier_id}")));
        }
        Ok(())
    }

    pub async fn create_buyer(&self, caller: &Caller, buyer: NewBuyer) -> Result<Buyer, DirectoryError> {
        check_new_buyer(&buyer)?;
        let buyer = self.db.insert_buyer(caller.user_id, buyer).await?;
        info!("🗃️ User #{} created buyer #{} ({})", caller.user_id, buyer.id, buyer.name);
        Ok(buyer)
    }

    pub async fn update_buyer(
        &self,
        caller: &Caller,
        buyer_id: i64,
        update: BuyerUpdate,
    ) -> Result<Buyer, DirectoryError> {
        check_buyer_update(&update)?;
        self.buyer(caller, buyer_id).await?;
        self.db.update_buyer(buyer_id, Self::owner(caller), update).await
    }

    /// Deleting a buyer deletes its basket and orders with it.
    pub async fn delete_buyer(&self, caller: &Caller, buyer_id: i64) -> Result<(), DirectoryError> {
        self.buyer(caller, buyer_id).await?;
        self.db.delete_buyer(buyer_id, Self::owner(caller)).await?;
        info!("🗃️ User #{} deleted buyer #{buyer_id}", caller.user_id);
        Ok(())
    }

    //------------------------------------------  Suppliers  ---------------------------------------------------------
    /// The public supplier directory.
    pub async fn suppliers(&self, page: Pagination) -> Result<Page<Supplier>, DirectoryError> {
        self.db.fetch_suppliers(None, page).await
    }

    pub async fn supplier(&self, supplier_id: i64) -> Result<Supplier, DirectoryError> {
        self.db.fetch_supplier(supplier_id, None).await?.ok_or(DirectoryError::SupplierNotFound(supplier_id))
    }

    pub async fn create_supplier(&self, caller: &Caller, supplier: NewSupplier) -> Result<Supplier, DirectoryError> {
        check_supplier_fields(
            Some(&supplier.name),
            Some(&supplier.person),
            Some(&supplier.phone),
            supplier.file_url.as_ref(),
            true,
        )?;
        let supplier = self.db.insert_supplier(caller.user_id, supplier).await?;
        info!("🗃️ User #{} created supplier #{} ({})", caller.user_id, supplier.id, supplier.name);
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        caller: &Caller,
        supplier_id: i64,
        update: SupplierUpdate,
    ) -> Result<Supplier, DirectoryError> {
        check_supplier_fields(
            update.name.as_ref(),
            update.person.as_ref(),
            update.phone.as_ref(),
            update.file_url.as_ref(),
            false,
        )?;
        self.ensure_supplier_access(caller, supplier_id).await?;
        let supplier = self.db.update_supplier(supplier_id, Self::owner(caller), update).await?;
        debug!("🗃️ Supplier #{supplier_id} updated. Available: {}", supplier.is_available);
        Ok(supplier)
    }

    pub async fn delete_supplier(&self, caller: &Caller, supplier_id: i64) -> Result<(), DirectoryError> {
        self.ensure_supplier_access(caller, supplier_id).await?;
        self.db.delete_supplier(supplier_id, Self::owner(caller)).await?;
        info!("🗃️ User #{} deleted supplier #{supplier_id}", caller.user_id);
        Ok(())
    }
}
