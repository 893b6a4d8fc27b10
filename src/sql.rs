//! SQL sent to the inspection endpoint. Codes are integers, so they are
//! formatted straight into the statement; callers never pass an empty list.

const LOCATION_COLUMNS: &str =
    "CODLOCAL, CODLOCALPAI, LTRIM(RTRIM(DESCRLOCAL)) AS DESCRLOCAL";

const PRODUCT_COLUMNS: &str = "P.CODPROD, LTRIM(RTRIM(P.DESCRPROD)) AS DESCRPROD, \
     LTRIM(RTRIM(P.UNIDADE)) AS UNIDADE, LTRIM(RTRIM(P.MARCA)) AS MARCA, P.NCM";

fn in_list(codes: &[i64]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn children_of(parents: &[i64]) -> String {
    format!(
        "SELECT {LOCATION_COLUMNS} FROM [SANKHYA].[TGFLOC] \
         WHERE CODLOCALPAI IN ({}) ORDER BY CODLOCAL;",
        in_list(parents)
    )
}

pub fn locations_by_code(codes: &[i64]) -> String {
    format!(
        "SELECT {LOCATION_COLUMNS} FROM [SANKHYA].[TGFLOC] WHERE CODLOCAL IN ({});",
        in_list(codes)
    )
}

pub fn location_by_code(code: i64) -> String {
    format!("SELECT {LOCATION_COLUMNS} FROM [SANKHYA].[TGFLOC] WHERE CODLOCAL = {code};")
}

pub fn location_detail(code: i64) -> String {
    format!(
        "SELECT L.CODLOCAL, L.CODLOCALPAI, LTRIM(RTRIM(L.DESCRLOCAL)) AS DESCRLOCAL, \
         L.AD_DESCRBASE, L.UTILIZAWMS, L.CAPACIDADEPRODUCAO, L.CODPARC, \
         LTRIM(RTRIM(PAR.NOMEPARC)) AS NOMEPARC, PAR.RAZAOSOCIAL, PAR.CGC_CPF, \
         PAR.TELEFONE, PAR.EMAIL \
         FROM [SANKHYA].[TGFLOC] L \
         LEFT JOIN [SANKHYA].[TGFPAR] PAR ON PAR.CODPARC = L.CODPARC \
         WHERE L.CODLOCAL = {code};"
    )
}

/// Stock summed per (product, location) for every listed location.
pub fn stock_for_locations(codes: &[i64]) -> String {
    format!(
        "SELECT {PRODUCT_COLUMNS}, E.CODLOCAL, SUM(ISNULL(E.ESTOQUE,0)) AS TOTAL_ESTOQUE \
         FROM [SANKHYA].[TGFEST] E JOIN [SANKHYA].[TGFPRO] P ON P.CODPROD = E.CODPROD \
         WHERE E.CODLOCAL IN ({}) \
         GROUP BY P.CODPROD, P.DESCRPROD, P.UNIDADE, P.MARCA, P.NCM, E.CODLOCAL \
         ORDER BY E.CODLOCAL, P.DESCRPROD;",
        in_list(codes)
    )
}

/// Stock summed per product for a single location.
pub fn stock_at_location(code: i64) -> String {
    format!(
        "SELECT {PRODUCT_COLUMNS}, SUM(ISNULL(E.ESTOQUE,0)) AS TOTAL_ESTOQUE \
         FROM [SANKHYA].[TGFEST] E JOIN [SANKHYA].[TGFPRO] P ON P.CODPROD = E.CODPROD \
         WHERE E.CODLOCAL = {code} \
         GROUP BY P.CODPROD, P.DESCRPROD, P.UNIDADE, P.MARCA, P.NCM \
         ORDER BY P.DESCRPROD;"
    )
}

/// Most recent released inbound purchase line for a product.
pub fn last_purchase(product: i64) -> String {
    format!(
        "SELECT TOP 1 T.VLRUNIT, C.DTNEG, C.NUNOTA, C.CODEMP \
         FROM [SANKHYA].[TGFITE] T \
         JOIN [SANKHYA].[TGFCAB] C ON C.NUNOTA = T.NUNOTA AND C.CODEMP = T.CODEMP \
         WHERE T.CODPROD = {product} AND C.TIPMOV = 'O' AND C.STATUSNOTA = 'L' \
         ORDER BY C.DTNEG DESC;"
    )
}
