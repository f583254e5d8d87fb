// prompt composition - schema grounding for generation, rows for narration

/// HayMart MySQL schema handed to the model when it writes SQL.
pub const SCHEMA: &str = "\
Database schema (MySQL):

TABLE user (
  user_id INT PRIMARY KEY
  nama VARCHAR
  email VARCHAR
  password VARCHAR
  status VARCHAR
  image BLOB
  star_date DATE
  verification_code VARCHAR
  verification_code_expiry DATETIME
  is_verified BOOLEAN
  role_id INT REFERENCES role.role_id
)

TABLE role (
  role_id INT PRIMARY KEY
  role_name VARCHAR
)

TABLE produk (
  produk_id INT PRIMARY KEY
  nama VARCHAR
  harga INT
  stok INT
  keterangan VARCHAR
  status VARCHAR
  foto_produk BLOB
  kategori_id INT REFERENCES kategori.kategori_id
  deleted BOOLEAN
)

TABLE kategori (
  kategori_id INT PRIMARY KEY
  nama VARCHAR
)

TABLE pemesanan (
  pemesanan_id INT PRIMARY KEY
  kasir_id INT REFERENCES user.user_id
  tanggal_pembelian DATETIME
  total_harga BIGINT
)

TABLE detail_pemesanan (
  detail_pemesanan_id INT PRIMARY KEY
  pemesanan_id INT REFERENCES pemesanan.pemesanan_id
  produk_id INT REFERENCES produk.produk_id
  jumlah INT
  harga_satuan INT
  subtotal INT
)

TABLE laporan_produk (
  laporan_produk_id INT PRIMARY KEY
  produk_id INT REFERENCES produk.produk_id
  nama_produk VARCHAR
  jumlah_terjual INT
  stok INT
  harga_satuan INT
  total INT
  deleted BOOLEAN
)";

pub const SQL_SYSTEM: &str = "You translate natural language questions into MySQL queries.";

pub const NARRATOR_SYSTEM: &str =
    "You answer the user's question naturally, using only the database results you are given.";

pub fn generation_prompt(schema: &str, question: &str) -> String {
    format!(
        r#"Use this schema:
{schema}

User question: "{question}"

Rules:
- Output ONLY one valid SQL statement
- No explanations, no markdown, no extra text
- Use exact table and column names from the schema"#
    )
}

pub fn narration_prompt(question: &str, rows: &str) -> String {
    format!(
        r#"User question: "{question}"
Database query result:
{rows}

Write a short, friendly and clear answer based on the result above, in the same language as the question."#
    )
}

/// Models sometimes wrap sql in markdown code fences even when told not to.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```sql")
        .or_else(|| text.strip_prefix("```SQL"))
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
