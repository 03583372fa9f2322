/// Free-text input longer than this many characters is cut before prompting.
pub const CONTENT_PREFIX_CHARS: usize = 1000;

/// First `max` characters of `s` (char-boundary safe).
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Long-tail keyword list for a topic
pub fn keyword_hunter(topic: &str) -> String {
    format!(
        "Berikan daftar 15-20 kata kunci SEO long-tail yang relevan untuk topik: '{}'. \
         Kategorikan kata kunci ini (misalnya, Informatif, Navigasi, Transaksional, Komersial). \
         Fokus pada Bahasa Indonesia. Format sebagai daftar.",
        topic
    )
}

/// Meta title + description for a piece of content
pub fn meta_master(content: &str, keywords: &str) -> String {
    format!(
        "Buatlah Judul SEO (Meta Title) yang menarik (maksimal 60 karakter) dan Deskripsi Meta \
         (Meta Description) yang efektif (maksimal 160 karakter) dalam Bahasa Indonesia untuk \
         konten berikut. Jika ada, pertimbangkan kata kunci ini: '{}'.\n\nKonten:\n{}...",
        keywords,
        truncate_chars(content, CONTENT_PREFIX_CHARS)
    )
}

/// Draft blog article
pub fn article_forge(topic: &str, keywords: &str) -> String {
    format!(
        "Tulis draf artikel blog SEO-friendly sekitar 500-700 kata dalam Bahasa Indonesia tentang \
         topik '{}'. Masukkan kata kunci berikut secara alami jika memungkinkan: '{}'. \
         Sertakan judul, pendahuluan, beberapa subjudul (H2), dan kesimpulan.",
        topic, keywords
    )
}

pub fn seo_analyzer(url: &str, analysis: &str) -> String {
    format!(
        "Anda adalah asisten SEO. Berdasarkan URL '{}' dan analisis awal (simulasi) ini:\n{}\n\n\
         Berikan ringkasan singkat tentang potensi masalah SEO on-page utama dan saran perbaikan \
         umum dalam Bahasa Indonesia. Fokus pada aspek yang dapat dievaluasi dari data yang \
         diberikan atau pengetahuan SEO umum.",
        url, analysis
    )
}

pub fn news_radar(query: &str, news_context: &str) -> String {
    format!(
        "Topik/Kata Kunci Pencarian Berita: '{}'\n\
         Berikut adalah beberapa rangkuman berita/informasi terkini yang relevan (simulasi):\n{}\n\
         Berikan analisis singkat mengenai berita ini dalam Bahasa Indonesia. Apa implikasinya \
         dari sudut pandang SEO atau konten? Apa tren utama yang terlihat?",
        query, news_context
    )
}
