//! The account keeper
//!
//! [`AccountKeeper`] is the single entry point other subsystems use to
//! create, fetch, update and remove accounts. It composes the
//! [`AccountStore`], the [`AccountCodec`], the [`PermissionTable`] and the
//! [`Bech32Codec`], and is where the registry invariants are enforced.
//!
//! The keeper holds no locks and no mutable state: every method takes the
//! caller's [`StoreContext`], and nothing it writes survives unless that
//! context is committed. Methods returning a fatal error (see
//! [`CustosError::is_fatal`]) leave the context in a state the caller must
//! drop.

use crate::account::{Account, AccountI, BaseAccount, ModuleAccount, ModuleAccountI, PubKey};
use crate::codec::AccountCodec;
use crate::keys;
use crate::params::Params;
use crate::permissions::PermissionTable;
use crate::store::AccountStore;
use custos_common::prelude::*;
use tracing::Span;

/// Subsystem name the keeper logs under
pub const LOG_MODULE: &str = "x/auth";

fn empty_base_account() -> Account {
    Account::Base(BaseAccount::default())
}

/// Account registry
#[derive(Debug, Clone)]
pub struct AccountKeeper {
    store: AccountStore,
    codec: AccountCodec,
    permissions: PermissionTable,
    address_codec: Bech32Codec,
    proto: fn() -> Account,
}

impl AccountKeeper {
    /// Create a keeper for the given module permissions and Bech32 prefix
    pub fn new(permissions: PermissionTable, bech32_prefix: &str) -> CustosResult<Self> {
        let codec = AccountCodec::new();
        Ok(Self {
            store: AccountStore::new(codec),
            codec,
            permissions,
            address_codec: Bech32Codec::new(bech32_prefix)?,
            proto: empty_base_account,
        })
    }

    /// Replace the prototype [`AccountKeeper::new_account_with_address`] starts from
    pub fn with_proto(mut self, proto: fn() -> Account) -> Self {
        self.proto = proto;
        self
    }

    /// Span every keeper log line is emitted under
    pub fn logger(&self) -> Span {
        tracing::info_span!("keeper", module = LOG_MODULE)
    }

    /// The configured module permissions
    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    /// The address text codec
    pub fn address_codec(&self) -> &Bech32Codec {
        &self.address_codec
    }

    /// The configured Bech32 human-readable prefix
    pub fn bech32_prefix(&self) -> &str {
        self.address_codec.prefix()
    }

    /// The underlying account store
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Build an unsaved account at `address` from the prototype, with a
    /// freshly allocated number.
    pub fn new_account_with_address(
        &self,
        ctx: &mut StoreContext<'_>,
        address: Address,
    ) -> CustosResult<Account> {
        let mut account = (self.proto)();
        account.set_address(address)?;
        self.new_account(ctx, account)
    }

    /// Assign a fresh number to `account`, keeping every other field.
    ///
    /// The account is not persisted.
    pub fn new_account(
        &self,
        ctx: &mut StoreContext<'_>,
        mut account: Account,
    ) -> CustosResult<Account> {
        let number = self.store.next_account_number(ctx)?;
        account.set_account_number(number)?;
        Ok(account)
    }

    /// Allocate and return the next account number
    pub fn get_next_account_number(
        &self,
        ctx: &mut StoreContext<'_>,
    ) -> CustosResult<AccountNumber> {
        self.store.next_account_number(ctx)
    }

    /// Whether an account is stored at `address`
    pub fn has_account(&self, ctx: &StoreContext<'_>, address: &Address) -> CustosResult<bool> {
        self.store.has(ctx, address)
    }

    /// Whether some account holds `account_number`
    pub fn has_account_address_by_id(
        &self,
        ctx: &StoreContext<'_>,
        account_number: AccountNumber,
    ) -> CustosResult<bool> {
        Ok(self.store.address_by_number(ctx, account_number)?.is_some())
    }

    /// Bech32 address of the account holding `account_number`
    pub fn get_account_address_by_id(
        &self,
        ctx: &StoreContext<'_>,
        account_number: AccountNumber,
    ) -> CustosResult<String> {
        let address = self
            .store
            .address_by_number(ctx, account_number)?
            .ok_or(CustosError::UnknownAccountNumber(account_number))?;
        self.address_codec.encode(&address)
    }

    /// The account stored at `address`, if any
    pub fn get_account(
        &self,
        ctx: &StoreContext<'_>,
        address: &Address,
    ) -> CustosResult<Option<Account>> {
        self.store.get(ctx, address)
    }

    /// Every stored account in address order
    pub fn get_all_accounts(&self, ctx: &StoreContext<'_>) -> CustosResult<Vec<Account>> {
        self.store.export_all(ctx)
    }

    /// Visit stored accounts in address order until `visitor` returns `true`
    pub fn iterate_accounts<F>(&self, ctx: &StoreContext<'_>, visitor: F) -> CustosResult<()>
    where
        F: FnMut(Account) -> bool,
    {
        self.store.iterate(ctx, visitor)
    }

    /// Persist `account`, replacing whatever is stored at its address
    pub fn set_account(&self, ctx: &mut StoreContext<'_>, account: &Account) -> CustosResult<()> {
        self.store.put(ctx, account)
    }

    /// Delete `account` and its number index entry
    pub fn remove_account(
        &self,
        ctx: &mut StoreContext<'_>,
        account: &Account,
    ) -> CustosResult<()> {
        self.store.remove(ctx, account)?;
        self.logger().in_scope(|| {
            tracing::debug!(
                address = %account.address(),
                account_number = account.account_number(),
                "removed account"
            )
        });
        Ok(())
    }

    /// Public key of the account at `address`
    pub fn get_pub_key(
        &self,
        ctx: &StoreContext<'_>,
        address: &Address,
    ) -> CustosResult<Option<PubKey>> {
        Ok(self.require_account(ctx, address)?.pub_key().cloned())
    }

    /// Sequence of the account at `address`
    pub fn get_sequence(
        &self,
        ctx: &StoreContext<'_>,
        address: &Address,
    ) -> CustosResult<Sequence> {
        Ok(self.require_account(ctx, address)?.sequence())
    }

    /// Check that every permission `macc` claims is configured for its module
    pub fn validate_permissions<M>(&self, macc: &M) -> CustosResult<()>
    where
        M: ModuleAccountI + ?Sized,
    {
        for permission in macc.permissions() {
            if !self.permissions.has_permission(macc.name(), permission) {
                return Err(CustosError::invalid_permission(format!(
                    "{permission} for module {}",
                    macc.name()
                )));
            }
        }
        Ok(())
    }

    /// Derived address of a configured module
    pub fn get_module_address(&self, module_name: &str) -> Option<Address> {
        self.permissions.module_address(module_name)
    }

    /// Derived address and configured permissions of a module
    pub fn get_module_address_and_permissions(
        &self,
        module_name: &str,
    ) -> Option<(Address, Vec<String>)> {
        self.permissions
            .module_address_and_permissions(module_name)
            .map(|(address, permissions)| (address, permissions.to_vec()))
    }

    /// The module's account, created with its configured permissions on
    /// first access, together with those permissions.
    ///
    /// Fails with `UnknownModule` for unconfigured modules and with the
    /// fatal `TypeMismatch` when the module's address holds a non-module
    /// account or another module's account.
    pub fn get_module_account_and_permissions(
        &self,
        ctx: &mut StoreContext<'_>,
        module_name: &str,
    ) -> CustosResult<(ModuleAccount, Vec<String>)> {
        let entry = self.permissions.lookup(module_name)?;

        if let Some(existing) = self.store.get(ctx, &entry.address)? {
            let macc = existing.into_module().ok_or_else(|| {
                CustosError::type_mismatch(format!(
                    "account at module address {} of {module_name} is not a module account",
                    entry.address
                ))
            })?;
            if macc.name != module_name {
                return Err(CustosError::type_mismatch(format!(
                    "module address {} of {module_name} holds the account of module {}",
                    entry.address, macc.name
                )));
            }
            return Ok((macc, entry.permissions.clone()));
        }

        let account = self.new_account(
            ctx,
            ModuleAccount::new(module_name, entry.permissions.iter().cloned()).into(),
        )?;
        self.set_account(ctx, &account)?;
        self.logger().in_scope(|| {
            tracing::info!(
                name = module_name,
                address = %account.address(),
                account_number = account.account_number(),
                "created module account"
            )
        });

        let macc = account
            .into_module()
            .ok_or_else(|| CustosError::internal("new module account lost its variant"))?;
        Ok((macc, entry.permissions.clone()))
    }

    /// The module's account, created on first access
    pub fn get_module_account(
        &self,
        ctx: &mut StoreContext<'_>,
        module_name: &str,
    ) -> CustosResult<ModuleAccount> {
        Ok(self.get_module_account_and_permissions(ctx, module_name)?.0)
    }

    /// Persist a module account
    pub fn set_module_account(
        &self,
        ctx: &mut StoreContext<'_>,
        macc: ModuleAccount,
    ) -> CustosResult<()> {
        self.set_account(ctx, &Account::Module(macc))
    }

    /// Encode an account exactly as it is stored
    pub fn marshal_account(&self, account: &Account) -> CustosResult<Vec<u8>> {
        self.codec.encode(account)
    }

    /// Decode bytes produced by [`AccountKeeper::marshal_account`]
    pub fn unmarshal_account(&self, bytes: &[u8]) -> CustosResult<Account> {
        self.codec.decode(bytes)
    }

    /// Stored parameters, or the defaults when none were set
    pub fn get_params(&self, ctx: &StoreContext<'_>) -> CustosResult<Params> {
        match ctx.get(keys::PARAMS_KEY)? {
            Some(bz) => Params::decode(&bz),
            None => Ok(Params::default()),
        }
    }

    /// Validate and store parameters
    pub fn set_params(&self, ctx: &mut StoreContext<'_>, params: &Params) -> CustosResult<()> {
        params.validate()?;
        ctx.set(keys::PARAMS_KEY, params.encode()?);
        Ok(())
    }

    fn require_account(&self, ctx: &StoreContext<'_>, address: &Address) -> CustosResult<Account> {
        self.store.get(ctx, address)?.ok_or_else(|| {
            let shown = self
                .address_codec
                .encode(address)
                .unwrap_or_else(|_| address.to_string());
            CustosError::unknown_address(shown)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{BURNER, MINTER, STAKING};

    fn keeper() -> AccountKeeper {
        let table = PermissionTable::new([
            ("fee_collector", vec![BURNER]),
            ("mint", vec![MINTER]),
            ("bonded_pool", vec![BURNER, STAKING]),
        ])
        .unwrap();
        AccountKeeper::new(table, "cosmos").unwrap()
    }

    #[test]
    fn test_fee_collector_scenario() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();

        let macc = keeper.get_module_account(&mut ctx, "fee_collector").unwrap();
        assert_eq!(*macc.address(), CryptoUtils::module_address("fee_collector"));
        assert_eq!(macc.account_number(), 0);
        assert_eq!(macc.permissions(), &[BURNER.to_string()]);
        assert!(keeper.validate_permissions(&macc).is_ok());

        let rogue = ModuleAccount::new("fee_collector", [MINTER]);
        let err = keeper.validate_permissions(&rogue).unwrap_err();
        assert!(matches!(err, CustosError::InvalidPermission(_)));
    }

    #[test]
    fn test_module_account_is_created_once() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();

        let first = keeper.get_module_account(&mut ctx, "bonded_pool").unwrap();
        let second = keeper.get_module_account(&mut ctx, "bonded_pool").unwrap();
        assert_eq!(first, second);
        assert_eq!(keeper.store().peek_next_account_number(&ctx).unwrap(), 1);
        ctx.commit().unwrap();

        let mut ctx = db.begin().unwrap();
        let third = keeper.get_module_account(&mut ctx, "bonded_pool").unwrap();
        assert_eq!(third, first);
    }

    #[test]
    fn test_unknown_module() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();

        let err = keeper.get_module_account(&mut ctx, "gov").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ctx.pending_writes(), 0);
        assert!(keeper.get_module_address("gov").is_none());
    }

    #[test]
    fn test_unconfigured_module_permissions() {
        let keeper = keeper();
        assert!(keeper
            .validate_permissions(&ModuleAccount::new("gov", Vec::<String>::new()))
            .is_ok());
        assert!(keeper
            .validate_permissions(&ModuleAccount::new("gov", [BURNER]))
            .is_err());
    }

    #[test]
    fn test_base_account_at_module_address_is_fatal() {
        let keeper = keeper();
        let db = Database::in_memory();

        let mut ctx = db.begin().unwrap();
        let squatter = keeper
            .new_account_with_address(&mut ctx, CryptoUtils::module_address("mint"))
            .unwrap();
        keeper.set_account(&mut ctx, &squatter).unwrap();
        ctx.commit().unwrap();

        let mut ctx = db.begin().unwrap();
        let err = keeper.get_module_account(&mut ctx, "mint").unwrap_err();
        assert!(matches!(err, CustosError::TypeMismatch(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_foreign_module_account_at_module_address_is_fatal() {
        let keeper = keeper();
        let db = Database::in_memory();

        let mut ctx = db.begin().unwrap();
        let mut imposter = ModuleAccount::new("mint", [MINTER, BURNER, STAKING]);
        imposter.base_account.address = CryptoUtils::module_address("fee_collector");
        keeper.set_module_account(&mut ctx, imposter).unwrap();
        ctx.commit().unwrap();

        let mut ctx = db.begin().unwrap();
        let err = keeper
            .get_module_account(&mut ctx, "fee_collector")
            .unwrap_err();
        assert!(matches!(err, CustosError::TypeMismatch(_)));
        assert!(err.is_fatal());
        assert_eq!(ctx.pending_writes(), 0);
    }

    #[test]
    fn test_dropped_context_rolls_back_allocation() {
        let keeper = keeper();
        let db = Database::in_memory();

        {
            let mut ctx = db.begin().unwrap();
            keeper.get_module_account(&mut ctx, "mint").unwrap();
            // a later fatal error abandons the scope
        }

        let mut ctx = db.begin().unwrap();
        assert!(!keeper
            .has_account(&ctx, &CryptoUtils::module_address("mint"))
            .unwrap());
        let macc = keeper.get_module_account(&mut ctx, "fee_collector").unwrap();
        assert_eq!(macc.account_number(), 0);
    }

    #[test]
    fn test_new_account_keeps_variant() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();

        let plain = keeper
            .new_account_with_address(&mut ctx, Address::new([1; 20]))
            .unwrap();
        assert_eq!(plain.account_number(), 0);
        assert!(!keeper.has_account(&ctx, plain.address()).unwrap());

        let mut proto = ModuleAccount::new("mint", [MINTER]);
        proto.base_account.sequence = 9;
        let numbered = keeper.new_account(&mut ctx, proto.into()).unwrap();
        assert_eq!(numbered.account_number(), 1);
        assert_eq!(numbered.sequence(), 9);
        assert!(numbered.is_module());
    }

    #[test]
    fn test_custom_prototype() {
        fn seeded() -> Account {
            let mut acc = BaseAccount::default();
            acc.sequence = 1;
            acc.into()
        }

        let keeper = keeper().with_proto(seeded);
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        let acc = keeper
            .new_account_with_address(&mut ctx, Address::new([3; 20]))
            .unwrap();
        assert_eq!(acc.sequence(), 1);
        assert_eq!(*acc.address(), Address::new([3; 20]));
    }

    #[test]
    fn test_sequence_and_pub_key_require_account() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        let key = PubKey::ed25519(vec![7; 32]).unwrap();
        let address = key.address();

        let err = keeper.get_sequence(&ctx, &address).unwrap_err();
        assert!(matches!(err, CustosError::UnknownAddress(ref m) if m.starts_with("cosmos1")));
        assert!(keeper.get_pub_key(&ctx, &address).is_err());

        let mut acc = keeper.new_account_with_address(&mut ctx, address).unwrap();
        keeper.set_account(&mut ctx, &acc).unwrap();
        assert_eq!(keeper.get_sequence(&ctx, &address).unwrap(), 0);
        assert_eq!(keeper.get_pub_key(&ctx, &address).unwrap(), None);

        acc.set_pub_key(key.clone()).unwrap();
        acc.set_sequence(4).unwrap();
        keeper.set_account(&mut ctx, &acc).unwrap();
        assert_eq!(keeper.get_sequence(&ctx, &address).unwrap(), 4);
        assert_eq!(keeper.get_pub_key(&ctx, &address).unwrap(), Some(key));
    }

    #[test]
    fn test_returned_accounts_are_copies() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        let acc = keeper
            .new_account_with_address(&mut ctx, Address::new([2; 20]))
            .unwrap();
        keeper.set_account(&mut ctx, &acc).unwrap();

        let mut copy = keeper.get_account(&ctx, acc.address()).unwrap().unwrap();
        copy.set_sequence(10).unwrap();
        assert_eq!(keeper.get_sequence(&ctx, acc.address()).unwrap(), 0);
    }

    #[test]
    fn test_lookup_by_number_and_remove() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        let acc = keeper
            .new_account_with_address(&mut ctx, Address::new([8; 20]))
            .unwrap();
        keeper.set_account(&mut ctx, &acc).unwrap();

        assert!(keeper.has_account_address_by_id(&ctx, 0).unwrap());
        let text = keeper.get_account_address_by_id(&ctx, 0).unwrap();
        assert_eq!(keeper.address_codec().decode(&text).unwrap(), *acc.address());

        keeper.remove_account(&mut ctx, &acc).unwrap();
        assert!(!keeper.has_account_address_by_id(&ctx, 0).unwrap());
        assert!(matches!(
            keeper.get_account_address_by_id(&ctx, 0),
            Err(CustosError::UnknownAccountNumber(0))
        ));

        // numbers are never reused
        assert_eq!(keeper.get_next_account_number(&mut ctx).unwrap(), 1);
    }

    #[test]
    fn test_iterate_accounts_stops_early() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        for name in ["mint", "fee_collector", "bonded_pool"] {
            keeper.get_module_account(&mut ctx, name).unwrap();
        }

        assert_eq!(keeper.get_all_accounts(&ctx).unwrap().len(), 3);
        let mut visited = Vec::new();
        keeper
            .iterate_accounts(&ctx, |acc| {
                visited.push(acc);
                true
            })
            .unwrap();
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_marshal_round_trip() {
        let keeper = keeper();
        let acc: Account = ModuleAccount::new("mint", [MINTER]).into();
        let bz = keeper.marshal_account(&acc).unwrap();
        assert_eq!(keeper.unmarshal_account(&bz).unwrap(), acc);
    }

    #[test]
    fn test_params() {
        let keeper = keeper();
        let db = Database::in_memory();
        let mut ctx = db.begin().unwrap();
        assert_eq!(keeper.get_params(&ctx).unwrap(), Params::default());

        let params = Params {
            tx_sig_limit: 3,
            ..Params::default()
        };
        keeper.set_params(&mut ctx, &params).unwrap();
        assert_eq!(keeper.get_params(&ctx).unwrap(), params);

        let bad = Params {
            max_memo_characters: 0,
            ..Params::default()
        };
        assert!(keeper.set_params(&mut ctx, &bad).is_err());
        assert_eq!(keeper.get_params(&ctx).unwrap(), params);
    }

    #[test]
    fn test_bad_prefix_rejected() {
        assert!(AccountKeeper::new(PermissionTable::empty(), "Cosmos").is_err());
        assert_eq!(keeper().bech32_prefix(), "cosmos");
    }
}
