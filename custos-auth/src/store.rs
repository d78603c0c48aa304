//! Persistent account storage
//!
//! [`AccountStore`] owns the persisted representation of accounts: the
//! global account-number counter, the primary `address -> account` index
//! and the secondary `account number -> address` index. Every method works
//! against a caller-supplied [`StoreContext`]; writes become durable only
//! when that context is committed.

use crate::account::{Account, AccountI};
use crate::codec::{AccountCodec, AccountEnvelope};
use crate::keys;
use custos_common::prelude::*;

/// Persistence component of the account registry
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountStore {
    codec: AccountCodec,
}

impl AccountStore {
    /// Store encoding accounts with `codec`
    pub fn new(codec: AccountCodec) -> Self {
        Self { codec }
    }

    /// The counter value the next allocation will return (absent counter reads as zero)
    pub fn peek_next_account_number(&self, ctx: &StoreContext<'_>) -> CustosResult<AccountNumber> {
        match ctx.get(keys::GLOBAL_ACCOUNT_NUMBER_KEY)? {
            Some(bz) => u64::decode(&bz).map_err(|e| {
                CustosError::corruption(format!("global account number is unreadable: {e}"))
            }),
            None => Ok(0),
        }
    }

    /// Hand out the current counter value and persist counter + 1 in the same context
    pub fn next_account_number(&self, ctx: &mut StoreContext<'_>) -> CustosResult<AccountNumber> {
        let number = self.peek_next_account_number(ctx)?;
        let next = number.checked_add(1).ok_or_else(|| {
            CustosError::corruption("global account number space exhausted")
        })?;
        self.set_next_account_number(ctx, next)?;
        Ok(number)
    }

    /// Overwrite the counter; used by genesis import
    pub fn set_next_account_number(
        &self,
        ctx: &mut StoreContext<'_>,
        next: AccountNumber,
    ) -> CustosResult<()> {
        ctx.set(keys::GLOBAL_ACCOUNT_NUMBER_KEY, next.encode()?);
        Ok(())
    }

    /// Whether an account is stored at `address`
    pub fn has(&self, ctx: &StoreContext<'_>, address: &Address) -> CustosResult<bool> {
        ctx.has(&keys::address_store_key(address))
    }

    /// The stored envelope at `address`, without interpreting its variant
    pub fn get_envelope(
        &self,
        ctx: &StoreContext<'_>,
        address: &Address,
    ) -> CustosResult<Option<AccountEnvelope>> {
        ctx.get(&keys::address_store_key(address))?
            .map(|bz| AccountEnvelope::from_bytes(&bz))
            .transpose()
    }

    /// The decoded account at `address`
    pub fn get(&self, ctx: &StoreContext<'_>, address: &Address) -> CustosResult<Option<Account>> {
        match ctx.get(&keys::address_store_key(address))? {
            Some(bz) => Ok(Some(self.decode_stored(address, &bz)?)),
            None => Ok(None),
        }
    }

    /// Write `account` under its address and refresh its number index entry.
    ///
    /// Any record previously stored at the address is replaced. Index
    /// entries of replaced records keep pointing at the address, which now
    /// belongs to `account`.
    pub fn put(&self, ctx: &mut StoreContext<'_>, account: &Account) -> CustosResult<()> {
        let bz = self.codec.encode(account)?;
        let address = *account.address();
        ctx.set(keys::address_store_key(&address), bz);
        ctx.set(
            keys::account_number_store_key(account.account_number()),
            address.to_vec(),
        );
        Ok(())
    }

    /// Delete `account` and its number index entry; absent accounts are a no-op.
    ///
    /// Only the index entry of `account`'s own number is touched. Numbers of
    /// records that were replaced at the same address (see
    /// [`AccountStore::put`]) keep pointing at the now empty address, so
    /// [`AccountStore::address_by_number`] may return an address with no
    /// account behind it.
    pub fn remove(&self, ctx: &mut StoreContext<'_>, account: &Account) -> CustosResult<()> {
        let address = *account.address();
        let number_key = keys::account_number_store_key(account.account_number());

        ctx.delete(keys::address_store_key(&address));
        // Leave the index alone if the number now belongs to another address.
        if let Some(indexed) = ctx.get(&number_key)? {
            if indexed.as_slice() == &address.as_bytes()[..] {
                ctx.delete(number_key);
            }
        }
        Ok(())
    }

    /// Address registered under `account_number`
    pub fn address_by_number(
        &self,
        ctx: &StoreContext<'_>,
        account_number: AccountNumber,
    ) -> CustosResult<Option<Address>> {
        ctx.get(&keys::account_number_store_key(account_number))?
            .map(|bz| {
                Address::from_slice(&bz).map_err(|e| {
                    CustosError::corruption(format!(
                        "index entry of account number {account_number}: {e}"
                    ))
                })
            })
            .transpose()
    }

    /// Address-ordered accounts as visible from `ctx` at call time.
    ///
    /// The raw entries are snapshotted up front; records are decoded as the
    /// iterator advances.
    pub fn iter(&self, ctx: &StoreContext<'_>) -> CustosResult<AccountIter> {
        self.iter_from(ctx, None)
    }

    /// Like [`AccountStore::iter`], but starting at `start` (inclusive).
    ///
    /// Entries below `start` are skipped by key and never decoded.
    pub fn iter_from(
        &self,
        ctx: &StoreContext<'_>,
        start: Option<&Address>,
    ) -> CustosResult<AccountIter> {
        let entries = match start {
            Some(address) => ctx.scan_from(
                keys::ADDRESS_STORE_PREFIX,
                &keys::address_store_key(address),
            )?,
            None => ctx.scan_prefix(keys::ADDRESS_STORE_PREFIX)?,
        };
        Ok(AccountIter {
            codec: self.codec,
            entries: entries.into_iter(),
        })
    }

    /// Visit accounts in address order until `visitor` returns `true`
    pub fn iterate<F>(&self, ctx: &StoreContext<'_>, mut visitor: F) -> CustosResult<()>
    where
        F: FnMut(Account) -> bool,
    {
        for account in self.iter(ctx)? {
            if visitor(account?) {
                break;
            }
        }
        Ok(())
    }

    /// Every stored account, in address order
    pub fn export_all(&self, ctx: &StoreContext<'_>) -> CustosResult<Vec<Account>> {
        self.iter(ctx)?.collect()
    }

    /// Store `accounts` with their existing numbers and move the counter
    /// past them.
    ///
    /// The counter ends at `max(current, next_account_number, highest + 1)`.
    /// Returns the resulting counter value.
    pub fn import_all(
        &self,
        ctx: &mut StoreContext<'_>,
        accounts: &[Account],
        next_account_number: AccountNumber,
    ) -> CustosResult<AccountNumber> {
        let mut next = self.peek_next_account_number(ctx)?.max(next_account_number);

        for account in accounts {
            let number = account.account_number();
            if let Some(owner) = self.address_by_number(ctx, number)? {
                if owner != *account.address() {
                    return Err(CustosError::validation(format!(
                        "account number {number} already assigned to {owner}"
                    )));
                }
            }

            self.put(ctx, account)?;
            next = next.max(number.checked_add(1).ok_or_else(|| {
                CustosError::validation(format!("account number {number} leaves no successor"))
            })?);
        }

        if next > 0 {
            self.set_next_account_number(ctx, next)?;
        }
        Ok(next)
    }

    fn decode_stored(&self, address: &Address, bz: &[u8]) -> CustosResult<Account> {
        let account = self.codec.decode(bz)?;
        if account.address() != address {
            return Err(CustosError::corruption(format!(
                "record stored under {} claims address {}",
                address,
                account.address()
            )));
        }
        Ok(account)
    }
}

/// Lazily decoding iterator over stored accounts
pub struct AccountIter {
    codec: AccountCodec,
    entries: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl Iterator for AccountIter {
    type Item = CustosResult<Account>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.entries.next()?;
        let store = AccountStore::new(self.codec);
        Some(
            keys::address_from_store_key(&key)
                .and_then(|address| store.decode_stored(&address, &value)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
