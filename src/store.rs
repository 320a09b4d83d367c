//! On-disk layout for parameters, keys and ciphertexts.
//!
//! Every artifact is a flat file holding exactly one encoded object:
//!
//! ```text
//! ckks_params.dat            shared parameters with their CRS
//! <party>_seckey.dat         secret key
//! <party>_pubkey.dat         public key
//! <party>_rlkey.dat          relinearization key
//! <party>_rtkey.dat          rotation key set
//! <party>_cipher_data.dat    ciphertext produced by the party
//! <name>_ckks_data.dat       combined result ciphertext
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::debug;

use crate::codec::BinaryCodec;
use crate::mkckks::{Ciphertext, Parameters};
use crate::mkrlwe::{PartyId, PublicKey, RelinearizationKey, RotationKeySet, SecretKey};

pub const PARAMS_FILE: &str = "ckks_params.dat";

/// Directory of encoded artifacts.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn params_path(&self) -> PathBuf {
        self.dir.join(PARAMS_FILE)
    }

    pub fn has_params(&self) -> bool {
        self.params_path().is_file()
    }

    pub fn save_params(&self, params: &Parameters) -> Result<()> {
        self.write(&self.params_path(), params)
    }

    pub fn load_params(&self) -> Result<Parameters> {
        self.read(&self.params_path())
    }

    pub fn save_secret_key(&self, sk: &SecretKey) -> Result<()> {
        self.write(&self.named_path(sk.id().as_str(), "seckey")?, sk)
    }

    pub fn load_secret_key(&self, party: &str) -> Result<SecretKey> {
        let sk: SecretKey = self.read(&self.named_path(party, "seckey")?)?;
        check_owner(party, sk.id())?;
        Ok(sk)
    }

    pub fn save_public_key(&self, pk: &PublicKey) -> Result<()> {
        self.write(&self.named_path(pk.id().as_str(), "pubkey")?, pk)
    }

    pub fn load_public_key(&self, party: &str) -> Result<PublicKey> {
        let pk: PublicKey = self.read(&self.named_path(party, "pubkey")?)?;
        check_owner(party, pk.id())?;
        Ok(pk)
    }

    pub fn save_relinearization_key(&self, rlk: &RelinearizationKey) -> Result<()> {
        self.write(&self.named_path(rlk.id().as_str(), "rlkey")?, rlk)
    }

    pub fn load_relinearization_key(&self, party: &str) -> Result<RelinearizationKey> {
        let rlk: RelinearizationKey = self.read(&self.named_path(party, "rlkey")?)?;
        check_owner(party, rlk.id())?;
        Ok(rlk)
    }

    pub fn save_rotation_keys(&self, party: &str, set: &RotationKeySet) -> Result<()> {
        self.write(&self.named_path(party, "rtkey")?, set)
    }

    pub fn load_rotation_keys(&self, party: &str) -> Result<RotationKeySet> {
        let set: RotationKeySet = self.read(&self.named_path(party, "rtkey")?)?;
        for id in set.party_ids() {
            check_owner(party, id)?;
        }
        Ok(set)
    }

    pub fn save_ciphertext(&self, party: &str, ct: &Ciphertext) -> Result<()> {
        self.write(&self.named_path(party, "cipher_data")?, ct)
    }

    pub fn load_ciphertext(&self, party: &str) -> Result<Ciphertext> {
        self.read(&self.named_path(party, "cipher_data")?)
    }

    /// Stores a combined ciphertext such as `sum` or `sub`.
    pub fn save_result(&self, name: &str, ct: &Ciphertext) -> Result<()> {
        self.write(&self.named_path(name, "ckks_data")?, ct)
    }

    pub fn load_result(&self, name: &str) -> Result<Ciphertext> {
        self.read(&self.named_path(name, "ckks_data")?)
    }

    fn named_path(&self, name: &str, kind: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(eyre::eyre!("`{}` cannot be used as a file name", name));
        }
        Ok(self.dir.join(format!("{name}_{kind}.dat")))
    }

    fn write<T: BinaryCodec>(&self, path: &Path, obj: &T) -> Result<()> {
        let bytes = obj
            .to_bytes()
            .with_context(|| format!("Failed to encode {}", path.display()))?;
        fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored artifact");
        Ok(())
    }

    fn read<T: BinaryCodec>(&self, path: &Path) -> Result<T> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let obj = T::from_bytes(&bytes)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "loaded artifact");
        Ok(obj)
    }
}

fn check_owner(requested: &str, found: &PartyId) -> Result<()> {
    if found.as_str() != requested {
        return Err(eyre::eyre!(
            "file for `{}` holds a key of `{}`",
            requested,
            found
        ));
    }
    Ok(())
}
