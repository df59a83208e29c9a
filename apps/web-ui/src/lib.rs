pub fn app_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>stockroom Product Registry</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 1.5rem; background: #fafafa; }
        main { max-width: 720px; margin: 0 auto; }
        section { background: #fff; border: 1px solid #ddd; border-radius: 8px; padding: 1rem; margin-bottom: 1rem; }
        h1, h2 { margin-top: 0; }
        label { display: block; margin: 0.4rem 0 0.2rem; font-weight: 600; }
        input, button { font: inherit; }
        input { width: 100%; padding: 0.5rem; border: 1px solid #ccc; border-radius: 6px; box-sizing: border-box; }
        .actions { margin-top: 0.6rem; display: flex; gap: 0.5rem; flex-wrap: wrap; }
        button { padding: 0.5rem 0.8rem; border: 1px solid #888; border-radius: 6px; background: #f5f5f5; cursor: pointer; }
        article { border: 1px solid #eee; border-radius: 6px; padding: 0.6rem; margin-top: 0.6rem; position: relative; }
        article button { position: absolute; right: 0.6rem; top: 0.6rem; }
        .muted { color: #666; font-size: 0.92rem; }
        .total { font-weight: 700; }
    </style>
</head>
<body>
    <main>
        <h1>stockroom Product Registry</h1>

        <section>
            <h2>Register Product</h2>
            <label for="field-name">Product name</label>
            <input id="field-name" placeholder="MacBook Air M2" />
            <label for="field-memory">Memory</label>
            <input id="field-memory" placeholder="16 GB" />
            <label for="field-storage">Storage</label>
            <input id="field-storage" placeholder="512 GB" />
            <label for="field-color">Color</label>
            <input id="field-color" placeholder="Midnight" />
            <label for="field-price">Price</label>
            <input id="field-price" type="number" placeholder="7800" />
            <div class="actions"><button onclick="registerProduct()">Register</button></div>
        </section>

        <section>
            <h2>Registered Products</h2>
            <p class="total">Total products: <span id="total-count">0</span></p>
            <div id="product-list"><p class="muted">Nothing registered yet.</p></div>
        </section>
    </main>

    <script>
        const FIELDS = ['name', 'memory', 'storage', 'color', 'price'];

        function fieldValue(name) {
            return document.getElementById('field-' + name).value;
        }

        function clearFields() {
            for (const name of FIELDS) {
                document.getElementById('field-' + name).value = '';
            }
        }

        function renderProducts(products) {
            document.getElementById('total-count').textContent = products.length;
            const list = document.getElementById('product-list');
            list.innerHTML = '';

            if (products.length === 0) {
                list.innerHTML = '<p class="muted">Nothing registered yet.</p>';
                return;
            }

            for (const product of products) {
                const data = product.data || {};
                const article = document.createElement('article');

                const rows = [['Name', product.name]];
                for (const [key, value] of Object.entries(data)) {
                    rows.push([key.charAt(0).toUpperCase() + key.slice(1), value]);
                }

                for (const [label, value] of rows) {
                    const p = document.createElement('p');
                    const b = document.createElement('b');
                    b.textContent = label + ': ';
                    p.appendChild(b);
                    p.appendChild(document.createTextNode(value ?? ''));
                    article.appendChild(p);
                }

                const remove = document.createElement('button');
                remove.textContent = 'Delete';
                remove.onclick = () => deleteProduct(product.id);
                article.appendChild(remove);

                list.appendChild(article);
            }
        }

        async function loadProducts() {
            try {
                const response = await fetch('/api/products');
                if (!response.ok) throw new Error('list failed: ' + response.status);
                renderProducts(await response.json());
            } catch (err) {
                console.error(err);
            }
        }

        async function registerProduct() {
            const payload = {};
            for (const name of FIELDS) {
                payload[name] = fieldValue(name);
            }

            try {
                const response = await fetch('/api/products', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(payload)
                });

                if (response.status === 422) {
                    const body = await response.json();
                    alert(body.error);
                    return;
                }
                if (!response.ok) throw new Error('register failed: ' + response.status);

                clearFields();
                await loadProducts();
            } catch (err) {
                console.error(err);
            }
        }

        async function deleteProduct(id) {
            try {
                const response = await fetch('/api/products/' + encodeURIComponent(id), {
                    method: 'DELETE'
                });
                if (!response.ok) throw new Error('delete failed: ' + response.status);
                await loadProducts();
            } catch (err) {
                console.error(err);
            }
        }

        loadProducts();
    </script>
</body>
</html>
"#
    .to_string()
}
